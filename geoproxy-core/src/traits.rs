//! Common traits for geoproxy.
//!
//! The resolver only ever talks to these interfaces, so production backends
//! (Redis, Nominatim) and in-test fakes are interchangeable.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::GeocodeResult;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key/value store with per-key expiration.
///
/// Values are opaque blobs; the store never interprets them.
///
/// Implementations might use:
/// - In-process memory (development, tests)
/// - A Redis-protocol server (production)
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a key.
    ///
    /// `Ok(None)` is a miss. An expired entry must read as a miss.
    /// Connectivity or protocol problems are `Err(CacheUnavailable)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Creates or overwrites `key`, expiring at `now + ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// GEOCODER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Upstream geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Runs one search for the raw, unescaped `query`.
    ///
    /// No matches is `Ok(vec![])`. Implementations must not retry.
    async fn fetch(&self, query: &str) -> Result<GeocodeResult>;
}
