//! TTL cache stores for geoproxy.
//!
//! Both stores implement [`geoproxy_core::CacheStore`]:
//!
//! - [`MemoryCache`]: in-process map with per-entry expiry and a size bound
//! - [`RedisCache`]: Redis-protocol server, expiry enforced server-side

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod redis_store;

pub use memory::{CacheStats, MemoryCache, MemoryCacheConfig};
pub use redis_store::{normalize_redis_url, RedisCache, RedisCacheConfig};
