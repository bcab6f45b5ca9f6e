// Client for our own /api/youtube routes
// This is what the CLI talks to; the API key only lives on the server

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::library::models::Video;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The server answered with an error body (`{error, message?}`).
    #[error("{}", api_message(.error, .message))]
    Api {
        status: u16,
        error: String,
        message: Option<String>,
    },

    #[error("could not reach the SoundWave server: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from the SoundWave server: {0}")]
    Decode(#[from] serde_json::Error),
}

fn api_message<'a>(error: &'a str, message: &'a Option<String>) -> &'a str {
    message.as_deref().unwrap_or(error)
}

impl ProxyError {
    /// The server is up but has no YouTube API key configured.
    pub fn needs_api_key_setup(&self) -> bool {
        match self {
            ProxyError::Api { error, message, .. } => {
                error.contains("API key")
                    || message.as_deref().is_some_and(|m| m.contains("API key"))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuggestionsBody {
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ProxyClient {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Video>, ProxyError> {
        let max_results = max_results.to_string();
        let body = self
            .get("/api/youtube/search", &[("q", query), ("maxResults", max_results.as_str())])
            .await?;
        let parsed: SearchBody = serde_json::from_str(&body)?;
        Ok(parsed.videos)
    }

    pub async fn suggestions(&self, query: &str) -> Result<SuggestionsBody, ProxyError> {
        let body = self.get("/api/youtube/suggestions", &[("q", query)]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ProxyError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or(ErrorBody {
            error: None,
            message: None,
        });
        Err(ProxyError::Api {
            status: status.as_u16(),
            error: parsed
                .error
                .unwrap_or_else(|| format!("request failed with status {status}")),
            message: parsed.message,
        })
    }
}
