//! Cache-aside resolver around a single upstream call.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use geoproxy_core::constants::DEFAULT_CACHE_TTL;
use geoproxy_core::error::{GeoproxyError, Result};
use geoproxy_core::traits::{CacheStore, Geocoder};
use geoproxy_core::types::{decode_places, encode_places, Resolution};

/// What to do with a cached blob that no longer decodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptEntryPolicy {
    /// Surface `CacheCorrupt` to the caller.
    #[default]
    Fail,
    /// Treat the entry as a miss; the fresh result overwrites it.
    Refetch,
}

impl FromStr for CorruptEntryPolicy {
    type Err = GeoproxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "refetch" | "miss" => Ok(Self::Refetch),
            other => Err(GeoproxyError::ConfigError(format!(
                "Unknown corrupt entry policy '{}' (expected 'fail' or 'refetch')",
                other
            ))),
        }
    }
}

/// Resolver configuration.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Lifetime of entries written after an upstream fetch
    pub cache_ttl: Duration,
    /// Handling of undecodable cache hits
    pub on_corrupt: CorruptEntryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            on_corrupt: CorruptEntryPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Overrides the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Overrides the corrupt entry policy.
    pub fn with_corrupt_policy(mut self, policy: CorruptEntryPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }
}

/// Resolves queries through a cache in front of an upstream geocoder.
///
/// 1. Look the query up in the cache store
/// 2. On a hit, decode and return it without touching the upstream
/// 3. On a miss, fetch from the upstream, write the result with the
///    configured TTL, then return it
///
/// Store and upstream failures propagate unchanged. There is no retry and no
/// coalescing: concurrent misses for one query each fetch, last write wins.
pub struct CacheAsideResolver {
    cache: Arc<dyn CacheStore>,
    upstream: Arc<dyn Geocoder>,
    config: ResolverConfig,
}

impl CacheAsideResolver {
    /// Creates a resolver with default configuration.
    pub fn new(cache: Arc<dyn CacheStore>, upstream: Arc<dyn Geocoder>) -> Self {
        Self::with_config(cache, upstream, ResolverConfig::default())
    }

    /// Creates a resolver with custom configuration.
    pub fn with_config(
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn Geocoder>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            upstream,
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `query`, used verbatim as the cache key.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        if let Some(blob) = self.cache.get(query).await? {
            match decode_places(&blob) {
                Ok(places) => {
                    debug!(results = places.len(), "Cache hit");
                    return Ok(Resolution::cached(places));
                }
                Err(e) => match self.config.on_corrupt {
                    CorruptEntryPolicy::Fail => {
                        return Err(GeoproxyError::CacheCorrupt {
                            key: query.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    CorruptEntryPolicy::Refetch => {
                        warn!(error = %e, "Corrupt cache entry, refetching");
                    }
                },
            }
        } else {
            debug!("Cache miss, fetching upstream");
        }

        let places = self.upstream.fetch(query).await?;

        let blob = encode_places(&places)?;
        self.cache.set(query, blob, self.config.cache_ttl).await?;

        info!(
            results = places.len(),
            ttl_ms = u64::try_from(self.config.cache_ttl.as_millis()).unwrap_or(u64::MAX),
            "Cached upstream result"
        );
        Ok(Resolution::fetched(places))
    }
}
