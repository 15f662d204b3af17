//! Sliding-window attempt limiter with escalating lockout.
//!
//! # Responsibilities
//! - Track credential attempts per client identity in a persisted file
//! - Decide allow/deny and remaining lockout on every check
//! - Garbage-collect idle entries as a side effect of every read
//!
//! # Design Decisions
//! - Policy is pure over a snapshot (`evaluate`/`record_attempt` take
//!   `now` as a parameter); persistence wraps it behind one mutex
//! - Every call is a read-modify-write of the full entry set; the mutex
//!   serializes them per process so concurrent attempts cannot lose
//!   updates
//! - A denied check surfaces HTTP 429 with Retry-After, not a 200-level
//!   payload flag

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::observability::metrics;
use crate::store::json_file;
use crate::time::now_millis;

/// Attempts allowed inside one window before lockout.
pub const MAX_ATTEMPTS: u32 = 5;

/// Sliding window length.
pub const TIME_WINDOW_MS: i64 = 15 * 60 * 1000;

/// Lockout duration once the attempt threshold is reached.
pub const LOCKOUT_MS: i64 = 60 * 60 * 1000;

/// One client's attempt history.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEntry {
    pub client_id: String,
    pub attempts: u32,
    pub first_attempt_at: i64,
    pub last_attempt_at: i64,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after_minutes: Option<u64>,
}

impl RateLimitDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_minutes: None,
        }
    }

    fn deny(retry_after_minutes: u64) -> Self {
        Self {
            allowed: false,
            retry_after_minutes: Some(retry_after_minutes),
        }
    }
}

fn ceil_minutes(ms: i64) -> u64 {
    ((ms + 59_999) / 60_000).max(0) as u64
}

/// Evaluate a check against the full entry set, mutating it in place.
///
/// Mutations (garbage collection, window and lockout resets) must be
/// persisted by the caller even when the verdict is "allowed".
pub fn evaluate(entries: &mut Vec<RateLimitEntry>, client_id: &str, now_ms: i64) -> RateLimitDecision {
    entries.retain(|e| now_ms - e.last_attempt_at < LOCKOUT_MS);

    let Some(entry) = entries.iter_mut().find(|e| e.client_id == client_id) else {
        return RateLimitDecision::allow();
    };

    if entry.attempts >= MAX_ATTEMPTS {
        let elapsed = now_ms - entry.last_attempt_at;
        if elapsed < LOCKOUT_MS {
            return RateLimitDecision::deny(ceil_minutes(LOCKOUT_MS - elapsed));
        }
        entry.attempts = 0;
        entry.first_attempt_at = now_ms;
    }

    if now_ms - entry.first_attempt_at > TIME_WINDOW_MS {
        entry.attempts = 0;
        entry.first_attempt_at = now_ms;
    }

    if entry.attempts >= MAX_ATTEMPTS {
        return RateLimitDecision::deny(ceil_minutes(LOCKOUT_MS));
    }

    RateLimitDecision::allow()
}

/// Record one failed attempt against the full entry set.
///
/// Not required to have been preceded by a check; the window reset is
/// re-applied here independently.
pub fn record_attempt(entries: &mut Vec<RateLimitEntry>, client_id: &str, now_ms: i64) {
    match entries.iter_mut().find(|e| e.client_id == client_id) {
        Some(entry) => {
            if now_ms - entry.first_attempt_at > TIME_WINDOW_MS {
                entry.attempts = 1;
                entry.first_attempt_at = now_ms;
            } else {
                entry.attempts += 1;
            }
            entry.last_attempt_at = now_ms;
        }
        None => entries.push(RateLimitEntry {
            client_id: client_id.to_string(),
            attempts: 1,
            first_attempt_at: now_ms,
            last_attempt_at: now_ms,
        }),
    }
}

/// File-backed limiter; all access funnels through one writer lock.
#[derive(Clone)]
pub struct RateLimiter {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl RateLimiter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Check whether this client may attempt. Persists side effects.
    pub async fn check(&self, client_id: &str) -> RateLimitDecision {
        let _guard = self.lock.lock().await;

        let mut entries: Vec<RateLimitEntry> = json_file::read_json_or_default(&self.path).await;
        let decision = evaluate(&mut entries, client_id, now_millis());
        self.persist(&entries).await;

        if !decision.allowed {
            tracing::warn!(client = %client_id, retry_after_minutes = ?decision.retry_after_minutes, "Rate limit exceeded");
            metrics::record_rate_limited("attempt_limit");
        }
        decision
    }

    /// Record a failed attempt for this client.
    pub async fn record(&self, client_id: &str) {
        let _guard = self.lock.lock().await;

        let mut entries: Vec<RateLimitEntry> = json_file::read_json_or_default(&self.path).await;
        record_attempt(&mut entries, client_id, now_millis());
        self.persist(&entries).await;
    }

    async fn persist(&self, entries: &[RateLimitEntry]) {
        if let Err(e) = json_file::write_json(&self.path, &entries).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist rate-limit state");
        }
    }
}
