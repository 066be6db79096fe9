//! Discovery API client
//!
//! Fetches the home feed and the user profile from the discovery backend.
//! These are the fetch producers behind the response cache: the cache never
//! calls them itself.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{HomeFeed, UserProfile};
use crate::geo::Coordinates;

/// Default backend used when none is configured
pub const DEFAULT_API_URL: &str = "https://api.nearby.app/v1";

const HOME_PATH: &str = "/home";
const PROFILE_PATH: &str = "/me";

/// Errors that can occur when calling the discovery API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Missing or rejected credentials
    #[error("Not authorized; sign in again")]
    Unauthorized,

    /// Server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Source of fresh data for cached resources
#[async_trait]
pub trait DiscoveryApi: Send + Sync {
    /// Home feed for the given coordinates, or a generic feed when unknown
    async fn home_feed(&self, at: Option<&Coordinates>) -> Result<HomeFeed, ApiError>;

    /// Profile of the signed-in user
    async fn user_profile(&self) -> Result<UserProfile, ApiError>;
}

/// Client for the discovery REST API
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl DiscoveryClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Create a new DiscoveryClient with a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query parameters for a home feed request
    fn home_feed_query(at: Option<&Coordinates>) -> Vec<(&'static str, String)> {
        match at {
            Some(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lng", c.longitude.to_string()),
            ],
            None => Vec::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "Requesting");

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        parse_body(status, &text)
    }
}

/// Maps a response status and body to a payload or an error
fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(body),
        });
    }
    Ok(serde_json::from_str(body)?)
}

/// Extracts `message` from an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl DiscoveryApi for DiscoveryClient {
    async fn home_feed(&self, at: Option<&Coordinates>) -> Result<HomeFeed, ApiError> {
        self.get_json(HOME_PATH, &Self::home_feed_query(at)).await
    }

    async fn user_profile(&self) -> Result<UserProfile, ApiError> {
        self.get_json(PROFILE_PATH, &[]).await
    }
}
