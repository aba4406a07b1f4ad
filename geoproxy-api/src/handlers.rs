//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use geoproxy_core::error::GeoproxyError;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /api?q=
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LookupParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let resolution = state.resolver.resolve(&params.q).await?;
    debug!(
        query = %params.q,
        cache = resolution.from_cache,
        results = resolution.places.len(),
        "Lookup served"
    );

    encode_json(StatusCode::OK, &LookupResponse::from(resolution))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        cache_backend: state.backend.as_str().into(),
        cache_ttl_seconds: state.resolver.config().cache_ttl.as_secs(),
    })
}

/// Serializes up front so an encode failure becomes an error response
/// instead of a truncated body.
fn encode_json<T: Serialize>(status: StatusCode, body: &T) -> Result<Response> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| ApiError::from(GeoproxyError::EncodeFailure(e.to_string())))?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}
