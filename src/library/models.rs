// Records persisted in the local data store
// Field names follow the JSON layout the web client used (camelCase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A YouTube search result, as returned by `/api/youtube/search` and kept in favorites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail: String,
    /// Display string such as `3:45`; empty when the details lookup had nothing.
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl Video {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// A local audio file added to the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub file: String,
    /// Seconds.
    pub duration: f64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    // Stored as typed; this is a local convenience login, not a security boundary
    pub password: String,
}

/// The logged-in user, without the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Session {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_uses_camel_case_and_skips_missing_optionals() {
        let video = Video {
            id: "abc".to_string(),
            title: "Song".to_string(),
            channel_title: "Channel".to_string(),
            thumbnail: "https://i.ytimg.com/vi/abc/mqdefault.jpg".to_string(),
            duration: "3:05".to_string(),
            published_at: None,
            view_count: None,
        };

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["channelTitle"], "Channel");
        assert!(json.get("viewCount").is_none());
        assert!(json.get("publishedAt").is_none());
    }

    #[test]
    fn session_drops_password() {
        let user = User {
            id: "1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let json = serde_json::to_string(&Session::from(&user)).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
