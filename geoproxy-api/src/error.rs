//! API error handling.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use geoproxy_core::error::GeoproxyError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
    retryable: bool,
}

/// Seconds suggested to clients in `Retry-After` on transient failures.
const RETRY_AFTER_SECS: &str = "1";

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
            retryable: false,
        }
    }

    /// Marks the error as transient, adding a `Retry-After` header.
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// Upstream answered badly or not at all.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "UPSTREAM_ERROR")
    }

    /// Upstream did not answer in time.
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message, "UPSTREAM_TIMEOUT")
    }

    /// Cache store unreachable.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "CACHE_UNAVAILABLE")
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether an identical request may succeed later.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        let mut response = (self.status, Json(body)).into_response();
        if self.retryable {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                header::HeaderValue::from_static(RETRY_AFTER_SECS),
            );
        }
        response
    }
}

impl From<GeoproxyError> for ApiError {
    fn from(err: GeoproxyError) -> Self {
        let retryable = err.is_recoverable();
        let api = match &err {
            GeoproxyError::CacheUnavailable(_) => {
                tracing::warn!(error = %err, "Cache store unavailable");
                ApiError::service_unavailable("Cache store unavailable")
            }
            GeoproxyError::UpstreamTimeout { .. } => {
                tracing::warn!(error = %err, "Upstream timeout");
                ApiError::gateway_timeout(err.to_string())
            }
            GeoproxyError::UpstreamUnavailable(_) | GeoproxyError::UpstreamBadResponse { .. } => {
                tracing::warn!(error = %err, "Upstream failure");
                ApiError::bad_gateway("Geocoding provider request failed")
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        };
        api.retryable(retryable)
    }
}
