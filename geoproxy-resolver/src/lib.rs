//! # Geoproxy Resolver
//!
//! Cache-aside resolution: read the cache, on a miss call the upstream
//! geocoder and populate the cache, on a hit return the cached places.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod resolver;

pub use resolver::{CacheAsideResolver, CorruptEntryPolicy, ResolverConfig};
