// Recent search queries, newest first

pub const MAX_RECENT_SEARCHES: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct RecentSearches {
    entries: Vec<String>,
}

impl RecentSearches {
    pub fn new(mut entries: Vec<String>) -> Self {
        entries.truncate(MAX_RECENT_SEARCHES);
        RecentSearches { entries }
    }

    /// Moves `query` to the front, dropping older copies and anything past the limit.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
