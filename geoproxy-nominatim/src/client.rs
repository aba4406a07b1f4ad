//! HTTP client for the Nominatim `/search` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use geoproxy_core::constants::{
    DEFAULT_NOMINATIM_URL, DEFAULT_UPSTREAM_TIMEOUT_SECS, NOMINATIM_FORMAT,
};
use geoproxy_core::error::{GeoproxyError, Result};
use geoproxy_core::traits::Geocoder;
use geoproxy_core::types::GeocodeResult;

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 256;

/// Nominatim client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Instance root (e.g., "https://nominatim.openstreetmap.org")
    pub base_url: String,
    /// User-Agent sent with every request; the public instance requires one
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.into(),
            user_agent: concat!("geoproxy/", env!("CARGO_PKG_VERSION")).into(),
            timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

impl NominatimConfig {
    /// Creates a config pointing at another instance.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Overrides the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Client for Nominatim searches.
pub struct NominatimClient {
    config: NominatimConfig,
    search_url: Url,
    http_client: reqwest::Client,
}

impl NominatimClient {
    /// Creates a client for the public instance.
    pub fn new() -> Result<Self> {
        Self::with_config(NominatimConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: NominatimConfig) -> Result<Self> {
        let search_url = search_endpoint(&config.base_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeoproxyError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            search_url,
            http_client,
        })
    }

    /// Builds the request URL for `query`, percent-encoding it.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", NOMINATIM_FORMAT);
        url
    }

    /// Runs one search.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<GeocodeResult> {
        let url = self.search_url(query);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeoproxyError::UpstreamBadResponse {
                status: Some(status.as_u16()),
                reason: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        let places: GeocodeResult =
            serde_json::from_slice(&body).map_err(|e| GeoproxyError::UpstreamBadResponse {
                status: None,
                reason: format!("Malformed search body: {}", e),
            })?;

        info!(results = places.len(), "Fetched from Nominatim");
        Ok(places)
    }

    fn transport_error(&self, err: reqwest::Error) -> GeoproxyError {
        if err.is_timeout() {
            GeoproxyError::UpstreamTimeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            debug!(error = %err, "Nominatim transport failure");
            GeoproxyError::UpstreamUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn fetch(&self, query: &str) -> Result<GeocodeResult> {
        self.search(query).await
    }
}

/// Resolves `{base}/search`, keeping any path prefix on the base.
fn search_endpoint(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| {
        GeoproxyError::ConfigError(format!("Invalid Nominatim URL '{}': {}", base_url, e))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            GeoproxyError::ConfigError(format!("Nominatim URL cannot be a base: {}", base_url))
        })?
        .pop_if_empty()
        .push("search");
    url.set_query(None);

    Ok(url)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
