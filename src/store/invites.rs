//! Invite code store (read-only collaborator).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::json_file;

/// A single invite code record, as written by the portal's admin flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub code: String,

    /// Deactivated codes stay in the file but no longer validate.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Set once a registration consumed the code.
    #[serde(default)]
    pub used: bool,

    /// Fields owned by the issuing flow are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

/// Read-only view over the invite code file.
#[derive(Clone)]
pub struct InviteStore {
    path: PathBuf,
}

impl InviteStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// True iff a matching, active, unused code exists.
    ///
    /// Codes match case-insensitively; surrounding whitespace on the
    /// submitted value is ignored.
    pub async fn is_valid(&self, submitted: &str) -> bool {
        let submitted = submitted.trim();
        if submitted.is_empty() {
            return false;
        }

        let codes: Vec<InviteCode> = json_file::read_json_or_default(&self.path).await;
        codes
            .iter()
            .any(|c| c.active && !c.used && c.code.eq_ignore_ascii_case(submitted))
    }
}
