//! Session resolution across independently-issued session stores.
//!
//! # Responsibilities
//! - Read opaque session tokens from request cookies
//! - Look them up in the user store (object keyed by token) and the
//!   admin store (array of records)
//! - Validate expiry; fail closed on anything missing or malformed
//!
//! # Design Decisions
//! - One `SessionStore` type with two backends hides the structural
//!   difference between the stores from the resolver
//! - Admin capability is a dual-path check: a user session flagged
//!   `isAdmin` (legacy) or a dedicated admin session (current); both
//!   stores are consulted on every call
//! - Tokens are opaque lookup keys; no structure is assumed

use std::collections::HashMap;
use std::path::PathBuf;

use axum::http::{header, HeaderMap};
use serde::Deserialize;

use crate::config::StorageConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::store::json_file;
use crate::time::now_millis;

/// Cookie carrying the user session token.
pub const USER_COOKIE: &str = "user_session";

/// Cookie carrying the admin session token.
pub const ADMIN_COOKIE: &str = "admin_session";

/// A user session record, as issued by the portal's login flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSession {
    user_id: String,
    username: String,
    #[serde(default)]
    email: String,
    expires_at: i64,
    #[serde(default)]
    is_admin: bool,
}

/// An admin session record, as issued by the separate admin login flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminSession {
    session_id: String,
    expires_at: i64,
}

/// The authenticated caller, as stored in the user session.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// Backend-agnostic view of one stored session.
#[derive(Debug, Clone)]
struct SessionClaims {
    expires_at: i64,
    user: Option<UserIdentity>,
}

impl SessionClaims {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at > now_ms
    }
}

/// One session store, in either of its two on-disk shapes.
enum SessionStore {
    /// JSON object keyed by session token.
    Keyed { path: PathBuf },
    /// JSON array of records carrying their own token.
    Listed { path: PathBuf },
}

impl SessionStore {
    async fn find(&self, token: &str) -> Option<SessionClaims> {
        match self {
            Self::Keyed { path } => {
                let sessions: HashMap<String, UserSession> = json_file::read_json(path).await?;
                let session = sessions.get(token)?;
                Some(SessionClaims {
                    expires_at: session.expires_at,
                    user: Some(UserIdentity {
                        user_id: session.user_id.clone(),
                        username: session.username.clone(),
                        email: session.email.clone(),
                        is_admin: session.is_admin,
                    }),
                })
            }
            Self::Listed { path } => {
                let sessions: Vec<AdminSession> = json_file::read_json(path).await?;
                let session = sessions.iter().find(|s| s.session_id == token)?;
                Some(SessionClaims {
                    expires_at: session.expires_at,
                    user: None,
                })
            }
        }
    }
}

/// Resolves request cookies to an authenticated identity.
pub struct SessionResolver {
    users: SessionStore,
    admins: SessionStore,
}

impl SessionResolver {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            users: SessionStore::Keyed {
                path: storage.user_sessions_path(),
            },
            admins: SessionStore::Listed {
                path: storage.admin_sessions_path(),
            },
        }
    }

    /// The authenticated end user, if any. Fails closed.
    pub async fn resolve_user(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let token = cookie_value(headers, USER_COOKIE)?;
        let claims = self.users.find(&token).await?;
        if !claims.is_live(now_millis()) {
            return None;
        }
        claims.user
    }

    /// Whether the caller holds the admin capability.
    ///
    /// True via either path; a failure on one path never masks the
    /// other.
    pub async fn resolve_admin(&self, headers: &HeaderMap) -> bool {
        let now = now_millis();

        let legacy = match self.resolve_user(headers).await {
            Some(user) => user.is_admin,
            None => false,
        };

        let current = match cookie_value(headers, ADMIN_COOKIE) {
            Some(token) => self
                .admins
                .find(&token)
                .await
                .map(|claims| claims.is_live(now))
                .unwrap_or(false),
            None => false,
        };

        legacy || current
    }

    /// Enforce the admin gate, distinguishing "not logged in" (401)
    /// from "logged in but not an administrator" (403).
    pub async fn require_admin(&self, headers: &HeaderMap) -> GatewayResult<()> {
        if self.resolve_admin(headers).await {
            return Ok(());
        }
        match self.resolve_user(headers).await {
            Some(_) => Err(GatewayError::Forbidden(
                "administrator access required".to_string(),
            )),
            None => Err(GatewayError::Unauthenticated(
                "authentication required".to_string(),
            )),
        }
    }
}

/// Extract one cookie's value from the request headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                let value = parts.next().unwrap_or("").trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Set-Cookie value that clears the named session cookie.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
