// Local account handling
// Plain email/password lookup against the users saved in the store. This is
// a convenience login for a single machine, not an authentication system.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::library::models::{Session, User};
use crate::library::store::Store;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User already exists.")]
    UserExists,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Not logged in. Run `soundwave login` or `soundwave register` first.")]
    NotLoggedIn,
}

pub struct Auth<'a> {
    store: &'a mut Store,
}

impl<'a> Auth<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Auth { store }
    }

    // Creates the account and logs it in straight away
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        if self.store.users.iter().any(|user| user.email == email) {
            return Err(AuthError::UserExists);
        }

        let mut stamp = Utc::now().timestamp_millis();
        while self.store.users.iter().any(|user| user.id == stamp.to_string()) {
            stamp += 1;
        }

        let user = User {
            id: stamp.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = Session::from(&user);
        self.store.users.push(user);
        self.store.session = Some(session.clone());

        info!(email, "registered new user");
        Ok(session)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self
            .store
            .users
            .iter()
            .find(|user| user.email == email && user.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session::from(user);
        self.store.session = Some(session.clone());
        info!(email, "logged in");
        Ok(session)
    }

    // Returns the session that was cleared, if there was one
    pub fn logout(&mut self) -> Option<Session> {
        self.store.session.take()
    }

    pub fn current(&self) -> Option<&Session> {
        self.store.session.as_ref()
    }
}

/// The logged-in user, or `NotLoggedIn`. Gates every command that touches user data.
pub fn require_session(store: &Store) -> Result<&Session, AuthError> {
    store.session.as_ref().ok_or(AuthError::NotLoggedIn)
}
