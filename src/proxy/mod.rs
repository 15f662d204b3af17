//! Reverse proxy gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Authenticated request
//!     → admin_daemon.rs | service.rs | search.rs (resolve target)
//!     → forward.rs (URL build, header filter, credential injection)
//!     → upstream daemon / bound service / media indexer
//!     → forward.rs (JSON re-encode or opaque relay, verbatim status)
//! ```
//!
//! # Design Decisions
//! - One forwarding contract shared by all three proxy shapes
//! - Explicit header deny-filter instead of blind copy
//! - "Upstream errored" relays the status verbatim; "upstream
//!   unreachable" synthesizes a 500 naming the target

pub mod admin_daemon;
pub mod forward;
pub mod search;
pub mod service;

pub use forward::{build_upstream_client, ProxyTarget, UpstreamClient};
