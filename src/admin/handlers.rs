use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::handlers::StatusResponse;
use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::security::session::{clear_cookie, ADMIN_COOKIE};
use crate::store::{ContentIssue, IssueStatus};
use crate::time::now_millis;

/// `POST /api/admin/logout`
pub async fn logout() -> Response {
    let body = Json(StatusResponse {
        success: true,
        message: "Logged out".to_string(),
    });
    (
        [(header::SET_COOKIE, clear_cookie(ADMIN_COOKIE))],
        body,
    )
        .into_response()
}

/// `GET /api/admin/content-issues`, newest first.
pub async fn list_content_issues(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<ContentIssue>>> {
    state.sessions.require_admin(&headers).await?;
    Ok(Json(state.issues.list_newest_first().await))
}

#[derive(Deserialize)]
pub struct UpdateIssueRequest {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateIssueResponse {
    pub success: bool,
    pub issue: ContentIssue,
}

/// `PUT /api/admin/content-issues`
pub async fn update_content_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateIssueRequest>,
) -> GatewayResult<Json<UpdateIssueResponse>> {
    state.sessions.require_admin(&headers).await?;

    let id = request
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::Validation("id is required".to_string()))?;

    let status = match request.status.as_deref() {
        Some("pending") => IssueStatus::Pending,
        Some("resolved") => IssueStatus::Resolved,
        Some("dismissed") => IssueStatus::Dismissed,
        _ => {
            return Err(GatewayError::Validation(
                "status must be one of pending, resolved, dismissed".to_string(),
            ))
        }
    };

    let issue = state.issues.update_status(id, status, now_millis()).await?;
    tracing::info!(issue = %issue.id, status = ?status, "Content issue updated");

    Ok(Json(UpdateIssueResponse {
        success: true,
        issue,
    }))
}
