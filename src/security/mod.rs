//! Access-control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (canonical client identity, rate-limit key)
//!     → rate_limit.rs (sliding-window attempt limiter, lockout)
//!     → session.rs (user/admin session resolution from cookies)
//!     → Pass to handler or proxy layer
//! ```
//!
//! # Design Decisions
//! - Fail closed: missing or malformed session state means unauthenticated
//! - Policy is pure functions over a state snapshot; persistence lives
//!   behind a single-writer lock
//! - Forwarded headers are trusted by placement (the gateway sits behind
//!   a proxy it controls); this is a stated limitation, not a check to add

pub mod client_ip;
pub mod rate_limit;
pub mod session;

pub use client_ip::client_ip;
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use session::{SessionResolver, UserIdentity};
