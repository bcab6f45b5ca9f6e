// YouTube Data API v3 client
// Search (music category only), batched per-video details, and the
// autocomplete endpoint. Upstream JSON is deserialized into the typed
// schemas below; anything that doesn't fit is logged and dropped.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::library::models::Video;
use crate::youtube::duration::format_iso8601_duration;
use crate::youtube::suggestions::parse_suggestion_payload;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SUGGEST_URL: &str = "https://clients1.google.com/complete/search";

/// YouTube's "Music" video category.
const MUSIC_CATEGORY_ID: &str = "10";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API key not configured")]
    MissingApiKey,

    #[error("YouTube API error: {status} - {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("autocomplete response could not be parsed")]
    UnparseableSuggestions,
}

// ==========================================
// UPSTREAM SCHEMAS
// ==========================================

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(self) -> String {
        self.medium
            .or(self.high)
            .or(self.default)
            .map(|thumbnail| thumbnail.url)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    id: String,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    // The API sends counts as strings
    view_count: Option<String>,
}

// ==========================================
// CLIENT
// ==========================================

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    api_key: Option<String>,
    api_base: String,
    suggest_url: String,
}

impl YouTubeClient {
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        suggest_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, YouTubeError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(YouTubeClient {
            http,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            suggest_url: suggest_url.into(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Searches music videos and attaches duration/view count from a second lookup.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Video>, YouTubeError> {
        let api_key = self.api_key.as_deref().ok_or(YouTubeError::MissingApiKey)?;

        debug!(query, max_results, "YouTube search request");
        let max_results = max_results.to_string();
        let body = self
            .get_text(
                &format!("{}/search", self.api_base),
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                    ("maxResults", max_results.as_str()),
                    ("key", api_key),
                ],
            )
            .await?;

        let search: SearchListResponse = match serde_json::from_str(&body) {
            Ok(search) => search,
            Err(e) => {
                warn!(error = %e, "unexpected search response shape, returning no results");
                return Ok(Vec::new());
            }
        };

        let hits: Vec<(String, Snippet)> = search
            .items
            .into_iter()
            .filter_map(|item| Some((item.id.video_id?, item.snippet)))
            .collect();
        debug!(count = hits.len(), "YouTube search returned videos");

        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        let details = self.video_details(&ids, api_key).await?;

        // Join on id, not on position: the details list may be reordered or short,
        // and the same id may appear in more than one hit
        let videos = hits
            .into_iter()
            .map(|(id, snippet)| {
                let detail = details.get(&id);
                let duration = detail
                    .and_then(|d| d.content_details.as_ref())
                    .and_then(|c| c.duration.as_deref())
                    .map(format_iso8601_duration)
                    .unwrap_or_default();
                let view_count = detail
                    .and_then(|d| d.statistics.as_ref())
                    .and_then(|s| s.view_count.as_deref())
                    .and_then(|count| count.parse().ok());

                Video {
                    id,
                    title: snippet.title,
                    channel_title: snippet.channel_title,
                    thumbnail: snippet.thumbnails.best_url(),
                    duration,
                    published_at: snippet.published_at,
                    view_count,
                }
            })
            .collect();

        Ok(videos)
    }

    async fn video_details(
        &self,
        ids: &[&str],
        api_key: &str,
    ) -> Result<HashMap<String, VideoDetails>, YouTubeError> {
        let ids = ids.join(",");
        let body = self
            .get_text(
                &format!("{}/videos", self.api_base),
                &[
                    ("part", "contentDetails,statistics"),
                    ("id", ids.as_str()),
                    ("key", api_key),
                ],
            )
            .await?;

        match serde_json::from_str::<VideoListResponse>(&body) {
            Ok(list) => Ok(list
                .items
                .into_iter()
                .map(|details| (details.id.clone(), details))
                .collect()),
            Err(e) => {
                warn!(error = %e, "unexpected video details shape, continuing without durations");
                Ok(HashMap::new())
            }
        }
    }

    /// Asks the autocomplete endpoint for completions of `query`.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>, YouTubeError> {
        let response = self
            .http
            .get(&self.suggest_url)
            .query(&[("client", "youtube"), ("ds", "yt"), ("q", query)])
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .send()
            .await?;
        let body = check_status(response).await?;

        let preview: String = body.chars().take(100).collect();
        debug!(%preview, "autocomplete response");
        parse_suggestion_payload(&body).ok_or(YouTubeError::UnparseableSuggestions)
    }

    async fn get_text(&self, url: &str, params: &[(&str, &str)]) -> Result<String, YouTubeError> {
        let response = self.http.get(url).query(params).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<String, YouTubeError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(YouTubeError::Upstream { status, body });
    }
    Ok(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Canned upstream used by the client and route tests.
    #[derive(Clone, Default)]
    pub(crate) struct MockUpstream {
        pub search_status: u16,
        pub search_body: String,
        pub videos_body: String,
        pub suggest_status: u16,
        pub suggest_body: String,
        pub hits: Arc<AtomicUsize>,
        pub last_videos_ids: Arc<std::sync::Mutex<Option<String>>>,
    }

    impl MockUpstream {
        pub fn hit_count(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn respond(status: u16, body: String) -> Response {
        let status = AxumStatus::from_u16(status).unwrap_or(AxumStatus::OK);
        (status, body).into_response()
    }

    async fn search_route(State(mock): State<MockUpstream>) -> Response {
        mock.hits.fetch_add(1, Ordering::SeqCst);
        respond(mock.search_status, mock.search_body.clone())
    }

    async fn videos_route(
        State(mock): State<MockUpstream>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        mock.hits.fetch_add(1, Ordering::SeqCst);
        *mock.last_videos_ids.lock().unwrap() = params.get("id").cloned();
        respond(200, mock.videos_body.clone())
    }

    async fn suggest_route(State(mock): State<MockUpstream>) -> Response {
        mock.hits.fetch_add(1, Ordering::SeqCst);
        respond(mock.suggest_status, mock.suggest_body.clone())
    }

    /// Serves `mock` on an ephemeral port and returns a client pointed at it.
    pub(crate) async fn spawn_mock(mock: MockUpstream, api_key: Option<&str>) -> YouTubeClient {
        let app = Router::new()
            .route("/youtube/v3/search", get(search_route))
            .route("/youtube/v3/videos", get(videos_route))
            .route("/complete/search", get(suggest_route))
            .with_state(mock);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        YouTubeClient::new(
            api_key.map(str::to_string),
            format!("http://{addr}/youtube/v3"),
            format!("http://{addr}/complete/search"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    pub(crate) fn search_item(id: &str, title: &str) -> Value {
        json!({
            "id": { "kind": "youtube#video", "videoId": id },
            "snippet": {
                "title": title,
                "channelTitle": "Channel",
                "publishedAt": "2024-01-01T00:00:00Z",
                "thumbnails": {
                    "default": { "url": format!("https://i.ytimg.com/vi/{id}/default.jpg") },
                    "medium": { "url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg") }
                }
            }
        })
    }

    pub(crate) fn details_item(id: &str, duration: &str, views: &str) -> Value {
        json!({
            "id": id,
            "contentDetails": { "duration": duration },
            "statistics": { "viewCount": views }
        })
    }

    pub(crate) fn ok_mock(search: Vec<Value>, details: Vec<Value>) -> MockUpstream {
        MockUpstream {
            search_status: 200,
            search_body: json!({ "items": search }).to_string(),
            videos_body: json!({ "items": details }).to_string(),
            suggest_status: 200,
            suggest_body: r#"["q",["q one","q two"]]"#.to_string(),
            ..MockUpstream::default()
        }
    }

    #[tokio::test]
    async fn search_joins_details_by_id() {
        // Details come back reversed and missing "b"
        let mock = ok_mock(
            vec![search_item("a", "First"), search_item("b", "Second"), search_item("c", "Third")],
            vec![details_item("c", "PT1H0M5S", "42"), details_item("a", "PT3M7S", "1000")],
        );
        let client = spawn_mock(mock.clone(), Some("key")).await;

        let videos = client.search("rain", 12).await.unwrap();

        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].id, "a");
        assert_eq!(videos[0].duration, "3:07");
        assert_eq!(videos[0].view_count, Some(1000));
        assert_eq!(videos[0].thumbnail, "https://i.ytimg.com/vi/a/mqdefault.jpg");
        assert_eq!(videos[1].duration, "");
        assert_eq!(videos[1].view_count, None);
        assert_eq!(videos[2].duration, "1:00:05");
        assert_eq!(mock.last_videos_ids.lock().unwrap().as_deref(), Some("a,b,c"));
    }

    #[tokio::test]
    async fn repeated_hits_share_their_details() {
        let mock = ok_mock(
            vec![search_item("a", "First"), search_item("a", "First again")],
            vec![details_item("a", "PT3M7S", "1000")],
        );
        let client = spawn_mock(mock, Some("key")).await;

        let videos = client.search("rain", 12).await.unwrap();

        assert_eq!(videos.len(), 2);
        for video in &videos {
            assert_eq!(video.duration, "3:07");
            assert_eq!(video.view_count, Some(1000));
        }
    }

    #[tokio::test]
    async fn search_without_key_makes_no_request() {
        let mock = ok_mock(vec![search_item("a", "First")], Vec::new());
        let client = spawn_mock(mock.clone(), None).await;

        let err = client.search("rain", 12).await.unwrap_err();
        assert!(matches!(err, YouTubeError::MissingApiKey));
        assert_eq!(mock.hit_count(), 0);
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let mock = MockUpstream {
            search_status: 403,
            search_body: "quota exceeded".to_string(),
            ..MockUpstream::default()
        };
        let client = spawn_mock(mock, Some("key")).await;

        match client.search("rain", 12).await {
            Err(YouTubeError::Upstream { status, body }) => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn schema_mismatch_yields_empty_results() {
        let mock = MockUpstream {
            search_status: 200,
            search_body: r#"{"items":[{"id":"not-an-object"}]}"#.to_string(),
            ..MockUpstream::default()
        };
        let client = spawn_mock(mock.clone(), Some("key")).await;

        assert!(client.search("rain", 12).await.unwrap().is_empty());
        // No details lookup for an empty hit list
        assert_eq!(mock.hit_count(), 1);
    }

    #[tokio::test]
    async fn channel_results_without_video_id_are_skipped() {
        let mut channel = search_item("x", "A channel");
        channel["id"] = json!({ "kind": "youtube#channel", "channelId": "UC123" });
        let mock = ok_mock(
            vec![channel, search_item("a", "First")],
            vec![details_item("a", "PT4M", "7")],
        );
        let client = spawn_mock(mock, Some("key")).await;

        let videos = client.search("rain", 12).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].duration, "4:00");
    }

    #[tokio::test]
    async fn suggestions_parse_upstream_payload() {
        let mock = ok_mock(Vec::new(), Vec::new());
        let client = spawn_mock(mock, None).await;

        let suggestions = client.suggestions("q").await.unwrap();
        assert_eq!(suggestions, vec!["q one", "q two"]);
    }

    #[tokio::test]
    async fn suggestions_fail_on_garbage() {
        let mock = MockUpstream {
            suggest_status: 200,
            suggest_body: "<html></html>".to_string(),
            ..MockUpstream::default()
        };
        let client = spawn_mock(mock, None).await;

        assert!(matches!(
            client.suggestions("q").await,
            Err(YouTubeError::UnparseableSuggestions)
        ));
    }
}
