//! Nominatim search client for geoproxy.
//!
//! One request per call, no retries. Implements [`geoproxy_core::Geocoder`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;

pub use client::{NominatimClient, NominatimConfig};
