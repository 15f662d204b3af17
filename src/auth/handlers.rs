use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::security::client_ip;
use crate::security::session::{clear_cookie, USER_COOKIE};

#[derive(Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// `GET /api/auth/check`
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthCheckResponse> {
    match state.sessions.resolve_user(&headers).await {
        Some(user) => Json(AuthCheckResponse {
            authenticated: true,
            username: Some(user.username),
            user_id: Some(user.user_id),
        }),
        None => Json(AuthCheckResponse {
            authenticated: false,
            username: None,
            user_id: None,
        }),
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /api/auth/logout`
pub async fn logout() -> Response {
    let body = Json(StatusResponse {
        success: true,
        message: "Logged out".to_string(),
    });
    (
        [(header::SET_COOKIE, clear_cookie(USER_COOKIE))],
        body,
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct VerifyInviteRequest {
    #[serde(default)]
    pub invite_code: Option<String>,
}

/// `POST /api/auth/verify-invite`
///
/// The rate-limited credential path: the limiter is checked before any
/// processing, and a failed attempt is recorded afterwards. Successful
/// attempts are not recorded.
pub async fn verify_invite(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<VerifyInviteRequest>,
) -> GatewayResult<Json<StatusResponse>> {
    let client = client_ip(&headers, Some(peer));

    let decision = state.rate_limiter.check(&client).await;
    if !decision.allowed {
        return Err(GatewayError::RateLimited {
            retry_after_minutes: decision.retry_after_minutes.unwrap_or(1),
        });
    }

    let code = request
        .invite_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GatewayError::Validation("invite_code is required".to_string()))?;

    if state.invites.is_valid(code).await {
        tracing::info!(client = %client, "Invite code accepted");
        return Ok(Json(StatusResponse {
            success: true,
            message: "Invite code accepted".to_string(),
        }));
    }

    tracing::info!(client = %client, "Invalid invite code attempt");
    state.rate_limiter.record(&client).await;

    Ok(Json(StatusResponse {
        success: false,
        message: "Invalid invite code".to_string(),
    }))
}
