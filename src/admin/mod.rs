//! Administrator surface: admin logout and content-issue management.
//! Every handler here passes the dual-path admin gate.

pub mod handlers;
