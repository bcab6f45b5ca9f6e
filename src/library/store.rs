// Local data store
// One JSON document per key inside the data directory, loaded once at
// startup and written back explicitly after a command changes something.
// Last write wins; there is no locking between concurrent CLI invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::library::favorites::{Favorites, Library};
use crate::library::models::{Session, User};
use crate::library::recent::RecentSearches;

const SESSION_FILE: &str = "session.json";
const USERS_FILE: &str = "users.json";
const SONGS_FILE: &str = "songs.json";
const FAVORITES_FILE: &str = "favorites.json";
const RECENT_FILE: &str = "recent_searches.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the client keeps between runs.
#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
    pub session: Option<Session>,
    pub users: Vec<User>,
    pub library: Library,
    pub favorites: Favorites,
    pub recent: RecentSearches,
}

impl Store {
    /// Reads every key from `dir`. Missing files load as empty values.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let store = Store {
            session: read_key(&dir, SESSION_FILE)?,
            users: read_key(&dir, USERS_FILE)?.unwrap_or_default(),
            library: Library::new(read_key(&dir, SONGS_FILE)?.unwrap_or_default()),
            favorites: Favorites::new(read_key(&dir, FAVORITES_FILE)?.unwrap_or_default()),
            recent: RecentSearches::new(read_key(&dir, RECENT_FILE)?.unwrap_or_default()),
            dir,
        };
        debug!(
            dir = %store.dir.display(),
            users = store.users.len(),
            favorites = store.favorites.len(),
            songs = store.library.len(),
            "store loaded"
        );
        Ok(store)
    }

    /// Writes every key back. A cleared session removes its file.
    pub fn save(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        match &self.session {
            Some(session) => write_key(&self.dir, SESSION_FILE, session)?,
            None => remove_key(&self.dir, SESSION_FILE)?,
        }
        write_key(&self.dir, USERS_FILE, &self.users)?;
        write_key(&self.dir, SONGS_FILE, self.library.songs())?;
        write_key(&self.dir, FAVORITES_FILE, self.favorites.videos())?;
        write_key(&self.dir, RECENT_FILE, self.recent.entries())?;

        debug!(dir = %self.dir.display(), "store saved");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn read_key<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Option<T>, StoreError> {
    let path = dir.join(file);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::Io { path, source }),
    };

    serde_json::from_str(&data)
        .map(Some)
        .map_err(|source| StoreError::Json { path, source })
}

fn write_key<T: Serialize + ?Sized>(dir: &Path, file: &str, value: &T) -> Result<(), StoreError> {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
}

fn remove_key(dir: &Path, file: &str) -> Result<(), StoreError> {
    let path = dir.join(file);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io { path, source }),
    }
}
