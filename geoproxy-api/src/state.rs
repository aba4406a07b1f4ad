//! App state: config, cache-aside resolver.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use geoproxy_cache::{MemoryCache, RedisCache, RedisCacheConfig};
use geoproxy_core::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_CACHE_OPERATION_TIMEOUT, DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_TTL,
    DEFAULT_NOMINATIM_URL, DEFAULT_PORT, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use geoproxy_core::error::{GeoproxyError, Result};
use geoproxy_core::traits::{CacheStore, Geocoder};
use geoproxy_nominatim::{NominatimClient, NominatimConfig};
use geoproxy_resolver::{CacheAsideResolver, CorruptEntryPolicy, ResolverConfig};

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Redis address; `None` selects the in-process cache
    pub redis_url: Option<String>,
    /// Listen port
    pub port: u16,
    /// Bind address
    pub bind_addr: String,
    /// TTL of cached results
    pub cache_ttl_seconds: u64,
    /// Namespace for Redis keys
    pub cache_prefix: String,
    /// Nominatim instance root
    pub nominatim_url: String,
    /// Upstream request timeout
    pub upstream_timeout_seconds: u64,
    /// User-Agent sent upstream
    pub user_agent: String,
    /// Handling of undecodable cache entries
    pub corrupt_entry_policy: CorruptEntryPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL.as_secs(),
            cache_prefix: DEFAULT_CACHE_PREFIX.into(),
            nominatim_url: DEFAULT_NOMINATIM_URL.into(),
            upstream_timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            user_agent: NominatimConfig::default().user_agent,
            corrupt_entry_policy: CorruptEntryPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            redis_url: var("REDIS_URL"),
            port: parse_var(&var, "PORT", defaults.port)?,
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cache_ttl_seconds: parse_var(&var, "CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
            cache_prefix: var("CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            nominatim_url: var("NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            upstream_timeout_seconds: parse_var(
                &var,
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults.upstream_timeout_seconds,
            )?,
            user_agent: var("USER_AGENT").unwrap_or(defaults.user_agent),
            corrupt_entry_policy: parse_var(
                &var,
                "CORRUPT_ENTRY_POLICY",
                defaults.corrupt_entry_policy,
            )?,
        })
    }

    /// Address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_addr.parse().map_err(|e| {
            GeoproxyError::ConfigError(format!("Invalid bind address '{}': {}", self.bind_addr, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Resolver settings derived from this config.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_ttl(Duration::from_secs(self.cache_ttl_seconds))
            .with_corrupt_policy(self.corrupt_entry_policy)
    }

    /// Upstream client settings derived from this config.
    pub fn nominatim_config(&self) -> NominatimConfig {
        NominatimConfig::new(&self.nominatim_url)
            .with_user_agent(&self.user_agent)
            .with_timeout(self.upstream_timeout_seconds)
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| GeoproxyError::ConfigError(format!("{}={}: {}", name, raw, e))),
        None => Ok(default),
    }
}

/// Which cache store backs the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process map
    Memory,
    /// Redis-protocol server
    Redis,
}

impl CacheBackend {
    /// Name reported by `/health` and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

/// Shared per-process state handed to every request.
pub struct AppState {
    /// Startup configuration
    pub config: ApiConfig,
    /// Cache-aside resolver
    pub resolver: CacheAsideResolver,
    /// Active cache store
    pub backend: CacheBackend,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Builds the cache store and Nominatim client described by `config`.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let (cache, backend): (Arc<dyn CacheStore>, CacheBackend) = match &config.redis_url {
            Some(address) => {
                let redis_config = RedisCacheConfig::new(address)?
                    .with_prefix(config.cache_prefix.clone())
                    .with_timeout(DEFAULT_CACHE_OPERATION_TIMEOUT);
                (Arc::new(RedisCache::new(redis_config)?), CacheBackend::Redis)
            }
            None => {
                warn!("REDIS_URL not set, caching in process memory");
                (Arc::new(MemoryCache::new()), CacheBackend::Memory)
            }
        };

        let upstream = Arc::new(NominatimClient::with_config(config.nominatim_config())?);

        Ok(Self::from_parts(config, cache, upstream, backend))
    }

    /// Assembles state from already-built collaborators.
    pub fn from_parts(
        config: ApiConfig,
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn Geocoder>,
        backend: CacheBackend,
    ) -> Self {
        let resolver = CacheAsideResolver::with_config(cache, upstream, config.resolver_config());
        Self {
            config,
            resolver,
            backend,
            started_at: Instant::now(),
        }
    }
}
