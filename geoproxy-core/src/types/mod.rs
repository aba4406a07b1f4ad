//! Domain types for geoproxy.
//!
//! - [`Place`]: one search hit returned by the provider
//! - [`GeocodeResult`]: the ordered hit list cached per query
//! - [`Resolution`]: a result plus where it came from

mod place;

pub use place::*;
