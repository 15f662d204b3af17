//! Named-service proxy with environment-bound targets.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::Request;
use axum::response::Response;

use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::proxy::forward::{forward, ProxyTarget};

/// `ANY /api/proxy/{serviceName}`: admin-gated generic forwarder.
///
/// The target base URL comes from a `SERVICE_URL_<NAME>` environment
/// binding resolved at request time; an unknown name 404s before any
/// network call.
pub async fn relay(
    State(state): State<AppState>,
    Path(service): Path<String>,
    req: Request<Body>,
) -> GatewayResult<Response> {
    state.sessions.require_admin(req.headers()).await?;

    let service = service.trim().to_ascii_lowercase();
    if service.is_empty()
        || !service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GatewayError::Validation(
            "service name must be alphanumeric with - or _".to_string(),
        ));
    }

    let binding = env_binding(&service);
    let base_url = std::env::var(&binding)
        .map_err(|_| GatewayError::NotFound(format!("no service binding for {service}")))?;

    let target = ProxyTarget {
        name: service.clone(),
        base_url,
        credential: None,
    };

    let (parts, body) = req.into_parts();
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("?{query}"),
        None => String::new(),
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

/// Environment variable name for a service: uppercased, `-` mapped to `_`.
fn env_binding(service: &str) -> String {
    format!(
        "SERVICE_URL_{}",
        service.to_ascii_uppercase().replace('-', "_")
    )
}
