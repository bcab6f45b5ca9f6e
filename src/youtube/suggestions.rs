// Search-as-you-type suggestions
// Parses the autocomplete endpoint's JSON/JSONP payload and generates
// keyword completions locally when that endpoint can't be used

use serde_json::Value;

/// Most suggestions passed through from upstream.
pub const MAX_SUGGESTIONS: usize = 8;

/// Most suggestions produced by the local fallback.
pub const MAX_FALLBACK_SUGGESTIONS: usize = 6;

const JSONP_PREFIX: &str = "window.google.ac.h(";

const MUSIC_KEYWORDS: [&str; 8] = [
    "music", "song", "cover", "live", "official", "remix", "acoustic", "lyrics",
];

const POPULAR_SUFFIXES: [&str; 4] = ["official music video", "lyrics", "cover", "live performance"];

/// Builds completions from the query alone. Never touches the network.
pub fn fallback_suggestions(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();

    let keyword_hits = MUSIC_KEYWORDS
        .iter()
        .filter(|keyword| !lowered.contains(*keyword))
        .map(|keyword| format!("{query} {keyword}"));

    let popular: Vec<String> = if query.chars().count() > 2 {
        POPULAR_SUFFIXES
            .iter()
            .map(|suffix| format!("{query} {suffix}"))
            .collect()
    } else {
        Vec::new()
    };

    keyword_hits
        .chain(popular)
        .take(MAX_FALLBACK_SUGGESTIONS)
        .collect()
}

/// Pulls the suggestion list out of an autocomplete response body.
///
/// Accepts plain JSON or the `window.google.ac.h(...)` JSONP wrapper. Returns
/// `None` when the body is not a JSON array, which callers treat as a failure.
/// An array without a second element is a valid empty answer.
pub fn parse_suggestion_payload(body: &str) -> Option<Vec<String>> {
    let body = body.trim();
    let json = if body.starts_with(JSONP_PREFIX) {
        let start = body.find('[')?;
        let end = body.rfind(']')?;
        if end < start {
            return None;
        }
        &body[start..=end]
    } else {
        body
    };

    let value: Value = serde_json::from_str(json).ok()?;
    let outer = value.as_array()?;

    let Some(entries) = outer.get(1).and_then(Value::as_array) else {
        return Some(Vec::new());
    };

    // Entries are plain strings (client=firefox) or `[text, type, meta]` (client=youtube)
    let suggestions = entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text.clone()),
            Value::Array(parts) => parts.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .take(MAX_SUGGESTIONS)
        .collect();

    Some(suggestions)
}
