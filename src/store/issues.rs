//! Content issue store.
//!
//! The gateway lists issues and updates their status; creation belongs
//! to the portal's report flow, which writes the same file.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{GatewayError, GatewayResult};
use crate::store::json_file;

/// Status values an administrator may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Pending,
    Resolved,
    Dismissed,
}

/// A reported content issue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIssue {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: IssueStatus,

    pub created_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    /// Fields owned by the report flow are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Read/write view over the content issue file.
///
/// Updates are read-modify-write of the whole file; the mutex
/// serializes writers within this process.
#[derive(Clone)]
pub struct IssueStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl IssueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All issues, newest first by creation time.
    pub async fn list_newest_first(&self) -> Vec<ContentIssue> {
        let mut issues: Vec<ContentIssue> = json_file::read_json_or_default(&self.path).await;
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        issues
    }

    /// Set the status of one issue, returning the updated record.
    pub async fn update_status(
        &self,
        id: &str,
        status: IssueStatus,
        now_ms: i64,
    ) -> GatewayResult<ContentIssue> {
        let _guard = self.write_lock.lock().await;

        let mut issues: Vec<ContentIssue> = json_file::read_json_or_default(&self.path).await;
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("content issue {id}")))?;

        issue.status = status;
        issue.updated_at = Some(now_ms);
        let updated = issue.clone();

        json_file::write_json(&self.path, &issues)
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to persist content issues: {e}")))?;

        Ok(updated)
    }
}
