//! Redis-backed cache store.
//!
//! Values live under `{prefix}{query}` and expire server-side via `SET .. PX`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use geoproxy_core::constants::{DEFAULT_CACHE_OPERATION_TIMEOUT, DEFAULT_CACHE_PREFIX};
use geoproxy_core::error::{GeoproxyError, Result};
use geoproxy_core::traits::CacheStore;

/// Configuration for [`RedisCache`].
#[derive(Clone, Debug)]
pub struct RedisCacheConfig {
    /// Server URL, e.g. `redis://localhost:6379`
    pub url: String,
    /// Key prefix for all cache entries
    pub prefix: String,
    /// Bound on connecting and on each command
    pub operation_timeout: Duration,
}

impl RedisCacheConfig {
    /// Creates a config for `address`, which may be a URL or a bare `host:port`.
    pub fn new(address: &str) -> Result<Self> {
        Ok(Self {
            url: normalize_redis_url(address)?,
            prefix: DEFAULT_CACHE_PREFIX.into(),
            operation_timeout: DEFAULT_CACHE_OPERATION_TIMEOUT,
        })
    }

    /// Overrides the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overrides the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Turns a bare `host:port` into a `redis://` URL.
pub fn normalize_redis_url(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(GeoproxyError::ConfigError("Redis address is empty".into()));
    }
    if address.contains("://") {
        Ok(address.to_string())
    } else {
        Ok(format!("redis://{}", address))
    }
}

/// Holds the shared connection with an epoch that changes on every install,
/// so a failure seen on an old connection cannot evict a newer one.
#[derive(Debug)]
struct ConnectionSlot<C> {
    epoch: u64,
    conn: Option<C>,
}

impl<C: Clone> ConnectionSlot<C> {
    fn new() -> Self {
        Self { epoch: 0, conn: None }
    }

    fn current(&self) -> Option<(u64, C)> {
        self.conn.as_ref().map(|c| (self.epoch, c.clone()))
    }

    fn install(&mut self, conn: C) -> u64 {
        self.epoch += 1;
        self.conn = Some(conn);
        self.epoch
    }

    /// Clears the slot if it still holds the connection from `epoch`.
    fn invalidate(&mut self, epoch: u64) -> bool {
        if self.epoch == epoch && self.conn.is_some() {
            self.conn = None;
            true
        } else {
            false
        }
    }
}

/// Redis implementation of [`CacheStore`].
///
/// A single multiplexed connection is opened on first use and shared by all
/// requests. When a command fails that connection is dropped and the next
/// call reconnects.
pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<ConnectionSlot<MultiplexedConnection>>,
    config: RedisCacheConfig,
}

impl RedisCache {
    /// Creates a store. No connection is made until the first command.
    pub fn new(config: RedisCacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| GeoproxyError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: Mutex::new(ConnectionSlot::new()),
            config,
        })
    }

    /// Creates a store for `address` with default prefix and timeout.
    pub fn from_address(address: &str) -> Result<Self> {
        Self::new(RedisCacheConfig::new(address)?)
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GeoproxyError::CacheUnavailable(format!(
                "Redis {} error: {}",
                op, e
            ))),
            Err(_) => Err(GeoproxyError::CacheUnavailable(format!(
                "Redis {} timed out after {:?}",
                op, self.config.operation_timeout
            ))),
        }
    }

    async fn get_connection(&self) -> Result<(u64, MultiplexedConnection)> {
        let mut slot = self.connection.lock().await;
        if let Some(current) = slot.current() {
            return Ok(current);
        }

        let conn = self
            .bounded("connect", self.client.get_multiplexed_async_connection())
            .await?;
        let epoch = slot.install(conn.clone());
        debug!(url = %self.config.url, epoch, "Connected to Redis");
        Ok((epoch, conn))
    }

    async fn reset_connection(&self, epoch: u64) {
        if self.connection.lock().await.invalidate(epoch) {
            warn!(epoch, "Dropped Redis connection");
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let (epoch, mut conn) = self.get_connection().await?;
        let redis_key = self.redis_key(key);

        let result: Result<Option<Vec<u8>>> = self.bounded("GET", conn.get(&redis_key)).await;
        if let Err(e) = &result {
            warn!(error = %e, "Redis GET failed");
            self.reset_connection(epoch).await;
        }
        result
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let (epoch, mut conn) = self.get_connection().await?;
        let redis_key = self.redis_key(key);
        // PX 0 is rejected by the server.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(&redis_key).arg(value).arg("PX").arg(ttl_ms);

        let result: Result<()> = self.bounded("SET", cmd.query_async(&mut conn)).await;
        if let Err(e) = &result {
            warn!(error = %e, "Redis SET failed");
            self.reset_connection(epoch).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_address() {
        assert_eq!(normalize_redis_url("localhost:6379").unwrap(), "redis://localhost:6379");
        assert_eq!(normalize_redis_url(" cache:6379 ").unwrap(), "redis://cache:6379");
    }

    #[test]
    fn test_normalize_keeps_scheme() {
        assert_eq!(normalize_redis_url("rediss://cache:6380/1").unwrap(), "rediss://cache:6380/1");
    }

    #[test]
    fn test_normalize_empty() {
        assert!(matches!(normalize_redis_url(""), Err(GeoproxyError::ConfigError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = RedisCacheConfig::new("localhost:6379")
            .unwrap()
            .with_prefix("geo:")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.prefix, "geo:");
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_key_prefix() {
        let cache = RedisCache::from_address("localhost:6379").unwrap();
        assert_eq!(cache.redis_key("Berlin"), "geoproxy:Berlin");
        assert_eq!(cache.redis_key(""), "geoproxy:");
    }

    #[test]
    fn test_invalid_url() {
        let config = RedisCacheConfig {
            url: "http://not-redis".into(),
            prefix: DEFAULT_CACHE_PREFIX.into(),
            operation_timeout: DEFAULT_CACHE_OPERATION_TIMEOUT,
        };
        assert!(matches!(RedisCache::new(config), Err(GeoproxyError::ConfigError(_))));
    }

    #[test]
    fn test_stale_failure_keeps_newer_connection() {
        let mut slot = ConnectionSlot::new();
        let first = slot.install("conn-a");

        // Task 1 fails on conn-a and drops it; task 2 reconnects.
        assert!(slot.invalidate(first));
        let second = slot.install("conn-b");

        // Task 3 still held conn-a and reports its failure late.
        assert!(!slot.invalidate(first));
        assert_eq!(slot.current(), Some((second, "conn-b")));

        assert!(slot.invalidate(second));
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn test_invalidate_empty_slot() {
        let mut slot: ConnectionSlot<&str> = ConnectionSlot::new();
        assert!(!slot.invalidate(0));
        assert_eq!(slot.current(), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable_not_miss() {
        let config = RedisCacheConfig::new("127.0.0.1:1")
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let cache = RedisCache::new(config).unwrap();

        let get = cache.get("Berlin").await;
        assert!(matches!(get, Err(GeoproxyError::CacheUnavailable(_))));

        let set = cache.set("Berlin", b"[]".to_vec(), Duration::from_secs(5)).await;
        assert!(matches!(set, Err(GeoproxyError::CacheUnavailable(_))));
    }
}
