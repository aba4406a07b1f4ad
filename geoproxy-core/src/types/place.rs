//! Place records as returned by Nominatim's `format=json` search.

use serde::{Deserialize, Serialize};

use crate::error::{GeoproxyError, Result};

/// A single search hit.
///
/// Field names follow the provider's JSON so upstream bodies deserialize
/// directly. Fields the provider adds beyond these are ignored. Identity,
/// position, name and classification are required, so an object that is
/// not a place (an error payload, `{}`) fails to decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Provider-internal place identifier
    pub place_id: u64,
    /// Data licence notice
    #[serde(default, alias = "license")]
    pub licence: String,
    /// OSM element kind ("node", "way", "relation"); absent for
    /// synthesized results such as postcode centroids
    #[serde(default)]
    pub osm_type: String,
    /// OSM element identifier
    #[serde(default)]
    pub osm_id: u64,
    /// `[min_lat, max_lat, min_lon, max_lon]`, kept as the provider's strings
    pub boundingbox: [String; 4],
    /// Latitude
    pub lat: String,
    /// Longitude
    #[serde(alias = "long")]
    pub lon: String,
    /// Human-readable full name
    pub display_name: String,
    /// Main OSM tag key (e.g. "boundary", "place")
    pub class: String,
    /// Main OSM tag value (e.g. "administrative", "city")
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider ranking score
    #[serde(default)]
    pub importance: f64,
    /// Optional icon URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Ordered list of places for one query.
pub type GeocodeResult = Vec<Place>;

/// Outcome of resolving a query.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// The places, in provider order
    pub places: GeocodeResult,
    /// Whether the places were served from the cache
    pub from_cache: bool,
}

impl Resolution {
    /// A result fetched from the provider.
    pub fn fetched(places: GeocodeResult) -> Self {
        Self {
            places,
            from_cache: false,
        }
    }

    /// A result served from the cache.
    pub fn cached(places: GeocodeResult) -> Self {
        Self {
            places,
            from_cache: true,
        }
    }
}

/// Serializes a result into the opaque blob stored in the cache.
pub fn encode_places(places: &[Place]) -> Result<Vec<u8>> {
    serde_json::to_vec(places).map_err(|e| GeoproxyError::EncodeFailure(e.to_string()))
}

/// Parses a blob produced by [`encode_places`].
pub fn decode_places(bytes: &[u8]) -> std::result::Result<GeocodeResult, serde_json::Error> {
    serde_json::from_slice(bytes)
}
