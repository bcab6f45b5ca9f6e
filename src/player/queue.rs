// ==========================================
// PLAYBACK QUEUE MODULE
// ==========================================
// Decides which item plays next when the user presses next/previous
// or when a track finishes on its own.
//
// Unlike a classic "up next" queue, nothing is consumed here: the
// favorites (or library) list IS the queue, and navigation is just
// moving the "current" pointer around it.
// - next() / previous() wrap around at both ends
// - shuffle picks any item at random (the current one included)
// - repeat makes a finished track start over instead of advancing

use rand::Rng;

use crate::library::models::{Song, Video};

// ==========================================
// PLAYABLE TRAIT
// ==========================================
// Anything the queue can navigate over. Favorites hold `Video`s,
// the local library holds `Song`s; both are identified by `id`.
pub trait Playable: Clone {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn artist(&self) -> &str;
    /// Length in seconds, when known.
    fn duration_secs(&self) -> Option<f64>;
    /// Something the system handler can open (URL or file path).
    fn location(&self) -> String;
}

impl Playable for Video {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn artist(&self) -> &str {
        &self.channel_title
    }

    fn duration_secs(&self) -> Option<f64> {
        crate::youtube::duration::parse_display_duration(&self.duration).map(|secs| secs as f64)
    }

    fn location(&self) -> String {
        self.watch_url()
    }
}

impl Playable for Song {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn artist(&self) -> &str {
        &self.artist
    }

    fn duration_secs(&self) -> Option<f64> {
        (self.duration.is_finite() && self.duration > 0.0).then_some(self.duration)
    }

    fn location(&self) -> String {
        self.file.clone()
    }
}

// ==========================================
// END ACTION
// ==========================================
// What the player should do when the current track reaches its end.
//
// Restart: repeat is on, play the same track again from 0:00
// Advance: move to this item (same rules as next())
// Stop:    nothing to play (empty queue)
#[derive(Debug, Clone, PartialEq)]
pub enum EndAction<T> {
    Restart,
    Advance(T),
    Stop,
}

// ==========================================
// QUEUE STRUCT
// ==========================================
// items:   the ordered collection we navigate over (insertion order)
// current: the item that is loaded in the player, if any
//          NOTE: it may no longer be in `items` (e.g. just removed
//          from favorites); navigation still works from there
// shuffle / repeat: the two toggles from the player controls
#[derive(Debug, Clone)]
pub struct Queue<T: Playable> {
    items: Vec<T>,
    current: Option<T>,
    shuffle: bool,
    repeat: bool,
}

impl<T: Playable> Queue<T> {
    pub fn new(items: Vec<T>) -> Self {
        Queue {
            items,
            current: None,
            shuffle: false,
            repeat: false,
        }
    }

    // ==========================================
    // SELECTION
    // ==========================================
    // Makes `item` the current one. The caller is responsible for
    // loading it into the player (which resets the position to zero).
    pub fn select(&mut self, item: T) -> &T {
        self.current.insert(item)
    }

    // Selects the item with this id, if the queue has it
    pub fn select_id(&mut self, id: &str) -> Option<&T> {
        let item = self.items.iter().find(|item| item.id() == id)?.clone();
        Some(self.select(item))
    }

    // Selects the first item, used when a session starts without an explicit pick
    pub fn select_first(&mut self) -> Option<&T> {
        let item = self.items.first()?.clone();
        Some(self.select(item))
    }

    // Swaps the collection (favorites changed). The current item is kept
    // even when it was removed so the player doesn't cut out mid-track.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    // ==========================================
    // NAVIGATION: previous()
    // ==========================================
    // - current at index i > 0     → items[i - 1]
    // - current first (or missing) → last item (wrap around)
    // - empty queue                → None, nothing changes
    pub fn previous(&mut self) -> Option<&T> {
        let last = self.items.len().checked_sub(1)?;
        let target = match self.current_index() {
            Some(index) if index > 0 => index - 1,
            _ => last,
        };
        self.select_index(target)
    }

    // ==========================================
    // NAVIGATION: next()
    // ==========================================
    // - shuffle on                → uniformly random item, may be the current one
    // - current not last          → the following item
    //   (a missing current counts as "before the first", so we get items[0])
    // - current is last           → first item (wrap around)
    // - empty queue               → None, nothing changes
    pub fn next(&mut self) -> Option<&T> {
        self.next_with_rng(&mut rand::rng())
    }

    // Same as next() with a caller-supplied random source (tests seed it)
    pub fn next_with_rng<R: Rng>(&mut self, rng: &mut R) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }

        let target = if self.shuffle {
            rng.random_range(0..self.items.len())
        } else {
            match self.current_index() {
                Some(index) if index + 1 < self.items.len() => index + 1,
                Some(_) => 0,
                None => 0,
            }
        };
        self.select_index(target)
    }

    // ==========================================
    // TRACK ENDED
    // ==========================================
    // One policy for both the YouTube and the local-file player:
    // repeat replays the same track, otherwise we advance like next()
    // (wrapping to the first item after the last one).
    pub fn on_track_ended(&mut self) -> EndAction<T> {
        self.on_track_ended_with_rng(&mut rand::rng())
    }

    pub fn on_track_ended_with_rng<R: Rng>(&mut self, rng: &mut R) -> EndAction<T> {
        if self.repeat && self.current.is_some() {
            return EndAction::Restart;
        }
        match self.next_with_rng(rng) {
            Some(item) => EndAction::Advance(item.clone()),
            None => EndAction::Stop,
        }
    }

    // ==========================================
    // TOGGLES
    // ==========================================
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    // ==========================================
    // INSPECTION
    // ==========================================
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // Position of the current item, looked up by id like the UI did
    fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.items.iter().position(|item| item.id() == current.id())
    }

    fn select_index(&mut self, index: usize) -> Option<&T> {
        let item = self.items.get(index)?.clone();
        Some(self.select(item))
    }
}
