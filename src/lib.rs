//! Access-control and request-gateway core for the media-request portal.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                 PORTAL GATEWAY                   │
//!                    │                                                  │
//!   Client Request   │  ┌──────────┐   ┌───────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│  http    │──▶│ security  │──▶│   proxy    │──┼──▶ admin daemon /
//!                    │  │  server  │   │ ip·rate·  │   │ forwarding │  │    bound services /
//!                    │  └──────────┘   │ sessions  │   └────────────┘  │    media indexers
//!                    │                 └─────┬─────┘                   │
//!                    │                       │                         │
//!                    │                 ┌─────▼─────┐                   │
//!                    │                 │   store   │  flat JSON files  │
//!                    │                 │  (ports)  │  re-read per req  │
//!                    │                 └───────────┘                   │
//!                    │                                                  │
//!                    │  config · error · lifecycle · observability      │
//!                    └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod security;
pub mod store;

// Request surfaces
pub mod admin;
pub mod auth;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod time;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
