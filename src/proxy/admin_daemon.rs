//! Path-prefix proxy to the admin daemon.
//!
//! Two inbound route shapes exist for historical reasons; both strip
//! their own prefix and must produce the identical effective upstream
//! URL for the same logical path.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::Response;

use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::proxy::forward::{forward, ProxyTarget};

/// Route prefix of the primary shape.
pub const ADMIN_PROXY_PREFIX: &str = "/api/admin-proxy";

/// Route prefix of the rewritten-path shape.
pub const ADMIN_PROXY_ALT_PREFIX: &str = "/api/admin-proxy-proxy";

/// `ANY /api/admin-proxy/**`
pub async fn relay(State(state): State<AppState>, req: Request<Body>) -> GatewayResult<Response> {
    relay_with_prefix(state, req, ADMIN_PROXY_PREFIX).await
}

/// `ANY /api/admin-proxy-proxy/**`
pub async fn relay_rewritten(
    State(state): State<AppState>,
    req: Request<Body>,
) -> GatewayResult<Response> {
    relay_with_prefix(state, req, ADMIN_PROXY_ALT_PREFIX).await
}

async fn relay_with_prefix(
    state: AppState,
    req: Request<Body>,
    prefix: &str,
) -> GatewayResult<Response> {
    let daemon = &state.config.admin_daemon;
    let target = ProxyTarget {
        name: "admin-daemon".to_string(),
        base_url: daemon.base_url.clone(),
        credential: Some(admin_credential(&daemon.token_header, &daemon.token)?),
    };

    let (parts, body) = req.into_parts();
    let logical_path = parts.uri.path().strip_prefix(prefix).unwrap_or("");
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{logical_path}?{query}"),
        None => logical_path.to_string(),
    };
    let url = target.upstream_url(&path_and_query);

    let bytes = axum::body::to_bytes(body, state.config.security.max_body_size)
        .await
        .map_err(|e| GatewayError::Validation(format!("unreadable request body: {e}")))?;

    forward(
        &state.upstream,
        &target,
        parts.method,
        &url,
        &parts.headers,
        bytes,
        state.upstream_timeout(),
        state.config.security.max_body_size,
    )
    .await
}

fn admin_credential(header_name: &str, token: &str) -> GatewayResult<(HeaderName, HeaderValue)> {
    let name: HeaderName = header_name
        .parse()
        .map_err(|_| GatewayError::Internal("invalid admin daemon token header name".to_string()))?;
    let value = HeaderValue::from_str(token)
        .map_err(|_| GatewayError::Internal("invalid admin daemon token value".to_string()))?;
    Ok((name, value))
}
