//! # Geoproxy Core
//!
//! Core types, errors, and traits shared by every geoproxy crate.
//!
//! - **Types**: [`Place`] records returned by the geocoding provider
//! - **Errors**: [`GeoproxyError`], one enum for store, upstream and encode failures
//! - **Constants**: defaults for TTL, upstream endpoint and key namespace
//! - **Traits**: [`CacheStore`] and [`Geocoder`], the seams the resolver is built on
//!
//! ## Example
//!
//! ```rust
//! use geoproxy_core::{GeocodeResult, Place};
//!
//! let places: GeocodeResult = vec![Place::default()];
//! let blob = geoproxy_core::encode_places(&places).unwrap();
//! assert_eq!(geoproxy_core::decode_places(&blob).unwrap(), places);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{GeoproxyError, Result};
pub use traits::*;
pub use types::*;
