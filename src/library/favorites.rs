// Favorites (YouTube videos) and the local song library
// Both are insertion-ordered and unique by id; that order is the play order.

use chrono::Utc;

use crate::library::models::{Song, Video};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Default)]
pub struct Favorites {
    videos: Vec<Video>,
}

impl Favorites {
    /// Wraps a persisted list, dropping any duplicate ids (first one wins).
    pub fn new(videos: Vec<Video>) -> Self {
        let mut favorites = Favorites::default();
        for video in videos {
            favorites.add(video);
        }
        favorites
    }

    /// Appends `video` unless its id is already saved.
    pub fn add(&mut self, video: Video) -> AddOutcome {
        if self.contains(&video.id) {
            return AddOutcome::AlreadyPresent;
        }
        self.videos.push(video);
        AddOutcome::Added
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.videos.len();
        self.videos.retain(|video| video.id != id);
        self.videos.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.videos.iter().any(|video| video.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Video> {
        self.videos.iter().find(|video| video.id == id)
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    songs: Vec<Song>,
}

impl Library {
    pub fn new(mut songs: Vec<Song>) -> Self {
        let mut seen = std::collections::HashSet::new();
        songs.retain(|song| seen.insert(song.id.clone()));
        Library { songs }
    }

    /// Adds a song with a timestamp id (milliseconds), bumped if it collides.
    /// A negative or non-finite duration is stored as 0 (unknown).
    pub fn add(&mut self, title: &str, artist: &str, file: &str, duration: f64) -> &Song {
        let now = Utc::now();
        let mut stamp = now.timestamp_millis();
        while self.get(&stamp.to_string()).is_some() {
            stamp += 1;
        }

        let song = Song {
            id: stamp.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            file: file.to_string(),
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            uploaded_at: now,
        };
        self.songs.push(song);
        &self.songs[self.songs.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.songs.len();
        self.songs.retain(|song| song.id != id);
        self.songs.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
