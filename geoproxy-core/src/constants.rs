//! Service-wide defaults.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of a cached geocoding result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Namespace prepended to every query before it reaches the cache store.
pub const DEFAULT_CACHE_PREFIX: &str = "geoproxy:";

/// Default bound on a single cache round-trip.
pub const DEFAULT_CACHE_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Response format requested from the provider.
pub const NOMINATIM_FORMAT: &str = "json";

/// Default bound on a single upstream call, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════════════

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
