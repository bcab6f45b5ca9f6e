// Handlers for /api/youtube/search and /api/youtube/suggestions

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::library::models::Video;
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::youtube::suggestions::fallback_suggestions;

pub const DEFAULT_MAX_RESULTS: u32 = 12;
// The Data API rejects anything above this
const MAX_RESULTS_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    #[serde(rename = "maxResults")]
    max_results: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = required_query(params.q)?;
    let max_results = parse_max_results(params.max_results.as_deref())?;

    info!(query = %query, max_results, "search request");
    let videos = state.youtube.search(&query, max_results).await?;
    info!(count = videos.len(), "search complete");

    Ok(Json(SearchResponse { videos }))
}

// Upstream trouble never turns into an error status here: we answer with
// locally generated completions instead
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let query = required_query(params.q)?;

    let response = match state.youtube.suggestions(&query).await {
        Ok(suggestions) => SuggestionsResponse {
            suggestions,
            fallback: false,
        },
        Err(e) => {
            warn!(error = %e, query = %query, "suggestions upstream failed, using fallback");
            SuggestionsResponse {
                suggestions: fallback_suggestions(&query),
                fallback: true,
            }
        }
    };

    Ok(Json(response))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn api_not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}

// Missing and empty are the same thing to the client
fn required_query(q: Option<String>) -> ApiResult<String> {
    q.filter(|q| !q.is_empty()).ok_or_else(ApiError::missing_query)
}

fn parse_max_results(raw: Option<&str>) -> ApiResult<u32> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_MAX_RESULTS);
    };

    match raw.parse::<u32>() {
        Ok(n) if (1..=MAX_RESULTS_LIMIT).contains(&n) => Ok(n),
        _ => Err(ApiError::bad_request("Invalid maxResults")
            .with_message(format!(
                "maxResults must be an integer between 1 and {MAX_RESULTS_LIMIT}"
            ))),
    }
}
