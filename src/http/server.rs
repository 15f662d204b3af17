//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and serve with graceful shutdown
//! - Hold the shared application state

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::RequestIdLayer;
use crate::lifecycle;
use crate::proxy::{admin_daemon, build_upstream_client, search, service, UpstreamClient};
use crate::security::{RateLimiter, SessionResolver};
use crate::store::{InviteStore, IssueStore};
use crate::{admin, auth};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: UpstreamClient,
    pub http: reqwest::Client,
    pub rate_limiter: RateLimiter,
    pub sessions: Arc<SessionResolver>,
    pub invites: InviteStore,
    pub issues: IssueStore,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let storage = &config.storage;
        let rate_limiter = RateLimiter::new(storage.rate_limit_path());
        let sessions = Arc::new(SessionResolver::new(storage));
        let invites = InviteStore::new(storage.invites_path());
        let issues = IssueStore::new(storage.issues_path());

        Self {
            config: Arc::new(config),
            upstream: build_upstream_client(),
            http: reqwest::Client::new(),
            rate_limiter,
            sessions,
            invites,
            issues,
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeouts.upstream_secs)
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState::new(config.clone());
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/auth/check", get(auth::handlers::check))
            .route("/api/auth/logout", post(auth::handlers::logout))
            .route("/api/auth/verify-invite", post(auth::handlers::verify_invite))
            .route("/api/admin/logout", post(admin::handlers::logout))
            .route(
                "/api/admin/content-issues",
                get(admin::handlers::list_content_issues).put(admin::handlers::update_content_issue),
            )
            .route("/api/media/search", get(search::media_search))
            .route("/api/admin-proxy", any(admin_daemon::relay))
            .route("/api/admin-proxy/{*path}", any(admin_daemon::relay))
            .route("/api/admin-proxy-proxy", any(admin_daemon::relay_rewritten))
            .route(
                "/api/admin-proxy-proxy/{*path}",
                any(admin_daemon::relay_rewritten),
            )
            .route("/api/proxy/{service}", any(service::relay))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(lifecycle::shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
