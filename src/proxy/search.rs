//! Media title search across the external indexer APIs.
//!
//! Two independent third-party lookups (movie and series), each
//! individually optional-configured. Without a type filter both run
//! concurrently and the results are aggregated; a partial failure
//! still yields 200 with a message describing what failed.

use serde::{Deserialize, Serialize};

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::config::IndexerConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/media/search?query=&type=`
pub async fn media_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> GatewayResult<Json<SearchResponse>> {
    let user = state
        .sessions
        .resolve_user(&headers)
        .await
        .ok_or_else(|| GatewayError::Unauthenticated("authentication required".to_string()))?;

    let query = params.query.trim();
    if query.len() < 2 {
        return Err(GatewayError::Validation(
            "query must be at least 2 characters".to_string(),
        ));
    }

    let kinds: &[MediaKind] = match params.kind.as_deref() {
        None | Some("") => &[MediaKind::Movie, MediaKind::Series],
        Some("movie") => &[MediaKind::Movie],
        Some("series") => &[MediaKind::Series],
        Some(other) => {
            return Err(GatewayError::Validation(format!(
                "unknown type '{other}', expected movie or series"
            )))
        }
    };

    tracing::debug!(user = %user.username, query = %query, kinds = ?kinds, "Media search");

    let outcomes: Vec<(MediaKind, Result<Vec<serde_json::Value>, String>)> = match kinds {
        [single] => vec![(*single, lookup(&state, *single, query).await)],
        _ => {
            let (movies, series) = tokio::join!(
                lookup(&state, MediaKind::Movie, query),
                lookup(&state, MediaKind::Series, query),
            );
            vec![(MediaKind::Movie, movies), (MediaKind::Series, series)]
        }
    };

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(items) => results.extend(items),
            Err(detail) => {
                tracing::warn!(indexer = kind.label(), error = %detail, "Indexer lookup failed");
                metrics::record_upstream_failure(kind.label());
                failures.push(detail);
            }
        }
    }

    if failures.len() == kinds.len() {
        return Err(GatewayError::UpstreamUnreachable {
            target: kinds
                .iter()
                .map(|k| k.label())
                .collect::<Vec<_>>()
                .join(", "),
            detail: failures.join("; "),
        });
    }

    let message = if failures.is_empty() {
        None
    } else {
        Some(failures.join("; "))
    };

    Ok(Json(SearchResponse { results, message }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    fn label(self) -> &'static str {
        match self {
            Self::Movie => "movie-indexer",
            Self::Series => "series-indexer",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    fn config(self, state: &AppState) -> Option<IndexerConfig> {
        match self {
            Self::Movie => state.config.indexers.movie.clone(),
            Self::Series => state.config.indexers.series.clone(),
        }
    }
}

/// Query one indexer, tagging each result with its media type.
async fn lookup(
    state: &AppState,
    kind: MediaKind,
    query: &str,
) -> Result<Vec<serde_json::Value>, String> {
    let Some(indexer) = kind.config(state) else {
        return Err(format!("{} is not configured", kind.label()));
    };

    let response = state
        .http
        .get(&indexer.base_url)
        .query(&[("query", query)])
        .header("X-Api-Key", &indexer.api_key)
        .timeout(state.upstream_timeout())
        .send()
        .await
        .map_err(|e| format!("{} unreachable: {e}", kind.label()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("{} returned {status}", kind.label()));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("{} returned unparseable JSON: {e}", kind.label()))?;

    let items = body
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    Ok(items
        .into_iter()
        .map(|mut item| {
            if let Some(object) = item.as_object_mut() {
                object.insert(
                    "mediaType".to_string(),
                    serde_json::Value::String(kind.tag().to_string()),
                );
            }
            item
        })
        .collect())
}
