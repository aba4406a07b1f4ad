//! Error types for geoproxy.
//!
//! Every failure a resolution can hit is one variant of [`GeoproxyError`].
//! A cache miss is not an error and never appears here.

use thiserror::Error;

/// Result type alias using `GeoproxyError`.
pub type Result<T> = std::result::Result<T, GeoproxyError>;

/// Main error type for all geoproxy operations.
#[derive(Debug, Error)]
pub enum GeoproxyError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache store could not be reached or answered with a protocol error.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A cached blob could not be decoded.
    #[error("Corrupt cache entry for '{key}': {reason}")]
    CacheCorrupt {
        /// Query whose entry failed to decode
        key: String,
        /// Decoder message
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transport failure talking to the geocoding provider.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider did not answer in time.
    #[error("Upstream timeout after {seconds}s")]
    UpstreamTimeout {
        /// Configured request timeout
        seconds: u64,
    },

    /// Non-success status or a body that is not a place list.
    #[error("Bad upstream response{}: {reason}", status_suffix(.status))]
    UpstreamBadResponse {
        /// HTTP status, if the failure was a non-success status
        status: Option<u16>,
        /// Response body excerpt or decoder message
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Serializing a result for the cache or the client failed.
    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl GeoproxyError {
    /// Returns true for failures of the cache store (including corrupt entries).
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self,
            GeoproxyError::CacheUnavailable(_) | GeoproxyError::CacheCorrupt { .. }
        )
    }

    /// Returns true for failures of the geocoding provider.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            GeoproxyError::UpstreamUnavailable(_)
                | GeoproxyError::UpstreamTimeout { .. }
                | GeoproxyError::UpstreamBadResponse { .. }
        )
    }

    /// Returns true if a later identical request may succeed.
    ///
    /// Nothing in geoproxy retries on its own; this only informs callers.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeoproxyError::CacheUnavailable(_)
                | GeoproxyError::UpstreamUnavailable(_)
                | GeoproxyError::UpstreamTimeout { .. }
        )
    }
}
