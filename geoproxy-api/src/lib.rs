//! # Geoproxy API Server
//!
//! HTTP front of the geocoding cache.
//!
//! ## Endpoints
//!
//! - `GET /api?q=<query>` - Resolve a query, `{"cache": bool, "data": [...]}`
//! - `GET /health` - Liveness and build info
//!
//! ## Example
//!
//! ```rust,ignore
//! use geoproxy_api::{ApiConfig, ApiServer};
//!
//! let config = ApiConfig::from_env()?;
//! let server = ApiServer::new(config)?;
//! server.run(([0, 0, 0, 0], 8080)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use dto::{HealthResponse, LookupParams, LookupResponse};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState, CacheBackend};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use geoproxy_core::error::Result;

/// API server for geoproxy.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server, building the cache and upstream from `config`.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self::with_state(AppState::new(config)?))
    }

    /// Creates a server around prepared state.
    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            %addr,
            cache = self.state.backend.as_str(),
            ttl_secs = self.state.config.cache_ttl_seconds,
            "geoproxy listening"
        );

        axum::serve(listener, self.router()).await
    }
}
