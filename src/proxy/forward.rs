//! The shared upstream forwarding algorithm.

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;

/// HTTP client used for all daemon/service forwarding.
pub type UpstreamClient = Client<HttpConnector, Body>;

pub fn build_upstream_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// A resolved upstream target.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    /// Short name used in logs, metrics and error messages.
    pub name: String,
    pub base_url: String,
    /// Service credential injected on the forwarded request.
    pub credential: Option<(HeaderName, HeaderValue)>,
}

impl ProxyTarget {
    /// Join the base URL with the remaining path and query.
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path_and_query.is_empty() || path_and_query == "/" {
            return format!("{base}/");
        }
        let rest = path_and_query.trim_start_matches('/');
        format!("{base}/{rest}")
    }
}

/// Headers never copied to the upstream request: transport-identifying
/// plus hop-by-hop. Content-length is re-derived from the body we send.
const STRIPPED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

fn is_stripped(name: &HeaderName) -> bool {
    STRIPPED_HEADERS.iter().any(|h| name.as_str() == *h)
}

/// Forward a buffered request to the target and relay the response.
///
/// The upstream status is propagated verbatim. A declared
/// `application/json` body is decoded and re-encoded; anything else is
/// relayed as opaque text. Connect failures and timeouts synthesize a
/// 500 naming the target.
pub async fn forward(
    client: &UpstreamClient,
    target: &ProxyTarget,
    method: Method,
    upstream_url: &str,
    inbound_headers: &HeaderMap,
    body: Bytes,
    timeout: Duration,
    max_response_bytes: usize,
) -> GatewayResult<Response> {
    let start = Instant::now();

    let uri: Uri = upstream_url
        .parse()
        .map_err(|e| GatewayError::Internal(format!("bad upstream url for {}: {e}", target.name)))?;
    let authority = uri.authority().map(|a| a.as_str().to_string());

    let mut builder = Request::builder().method(method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in inbound_headers {
            if !is_stripped(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        // The inbound host is gone; name the upstream instead.
        if let Some(authority) = authority {
            if let Ok(value) = HeaderValue::from_str(&authority) {
                headers.insert(header::HOST, value);
            }
        }
        if let Some((name, value)) = &target.credential {
            headers.insert(name.clone(), value.clone());
        }
    }

    let outbound_body = if method == Method::GET || method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(body)
    };
    let request = builder
        .body(outbound_body)
        .map_err(|e| GatewayError::Internal(format!("failed to build upstream request: {e}")))?;

    tracing::debug!(upstream = %target.name, url = %upstream_url, method = %method, "Forwarding request");

    let exchange = async {
        let response = client.request(request).await.map_err(|e| e.to_string())?;
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), max_response_bytes)
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>((parts.status, parts.headers, bytes))
    };

    let (status, headers, bytes) = match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(result)) => result,
        Ok(Err(detail)) => {
            return Err(unreachable_error(target, &method, detail, start));
        }
        Err(_) => {
            return Err(unreachable_error(
                target,
                &method,
                format!("no response within {}s", timeout.as_secs()),
                start,
            ));
        }
    };

    metrics::record_request(method.as_str(), status.as_u16(), &target.name, start);

    Ok(relay_response(status, &headers, bytes))
}

fn unreachable_error(
    target: &ProxyTarget,
    method: &Method,
    detail: String,
    start: Instant,
) -> GatewayError {
    tracing::error!(upstream = %target.name, error = %detail, "Upstream unreachable");
    metrics::record_upstream_failure(&target.name);
    metrics::record_request(method.as_str(), 500, &target.name, start);
    GatewayError::UpstreamUnreachable {
        target: target.name.clone(),
        detail,
    }
}

/// Re-encode declared JSON; relay anything else as opaque text.
fn relay_response(status: StatusCode, headers: &HeaderMap, bytes: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            return (status, Json(value)).into_response();
        }
        tracing::warn!(status = %status, "Upstream declared JSON but body did not parse, relaying raw");
    }

    let mut response = (status, bytes).into_response();
    if let Some(value) = headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, value.clone());
    }
    response
}
