//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON body returned for every gateway-originated failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Minutes until a rate-limited client may retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "retryAfterMinutes")]
    pub retry_after_minutes: Option<u64>,
}

/// Gateway error type.
///
/// Upstream non-2xx responses are NOT represented here; they are
/// relayed verbatim by the proxy layer. This enum covers only failures
/// the gateway itself originates.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("too many attempts, retry in {retry_after_minutes} minutes")]
    RateLimited { retry_after_minutes: u64 },

    #[error("upstream {target} unreachable: {detail}")]
    UpstreamUnreachable { target: String, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after_minutes = match &self {
            Self::RateLimited {
                retry_after_minutes,
            } => Some(*retry_after_minutes),
            _ => None,
        };
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            retry_after_minutes,
        };

        if let Some(minutes) = retry_after_minutes {
            // Retry-After is expressed in seconds on the wire.
            return (
                status,
                [("Retry-After", (minutes * 60).to_string())],
                Json(body),
            )
                .into_response();
        }
        (status, Json(body)).into_response()
    }
}

/// Result type for gateway handlers.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
