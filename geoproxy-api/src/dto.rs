//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

use geoproxy_core::types::{GeocodeResult, Resolution};

/// Query string of `GET /api`.
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    /// Free-text search, forwarded verbatim (may be empty)
    pub q: String,
}

/// Body of a successful `GET /api`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LookupResponse {
    /// True when served from the cache
    pub cache: bool,
    /// Places in provider order
    pub data: GeocodeResult,
}

impl From<Resolution> for LookupResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            cache: resolution.from_cache,
            data: resolution.places,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// "redis" or "memory"
    pub cache_backend: String,
    /// TTL applied to new cache entries
    pub cache_ttl_seconds: u64,
}
