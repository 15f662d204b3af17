//! Wall-clock helpers.
//!
//! All persisted timestamps are epoch-milliseconds integers; policy
//! functions take `now` as a parameter so tests can inject time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
