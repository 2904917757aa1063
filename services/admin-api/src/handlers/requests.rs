//! Request listing and request-level documents.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use bluesky_common::{AdminError, FilePayload, StatusDocument};
use storage::Artifact;

use super::{record_request, reply, OnError};
use crate::state::AppState;

/// Query parameters for `GET /api/requests`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsQuery {
    /// Kept as text so a bad value is reported like any other listing error.
    pub limit: Option<String>,
    pub next: Option<String>,
    pub date_prefix: Option<String>,
}

/// Treat `?next=` like an absent parameter.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse `?limit=`, falling back to the configured page size.
fn page_limit(limit: Option<&str>, default: usize) -> Result<usize, AdminError> {
    match limit {
        None => Ok(default),
        Some(raw) => match raw.parse::<usize>() {
            Ok(0) => Ok(default),
            Ok(limit) => Ok(limit),
            Err(_) => Err(AdminError::invalid(
                "limit",
                format!("'{}' is not a valid page size", raw),
            )),
        },
    }
}

/// GET /api/requests
pub async fn list_requests_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RequestsQuery>,
) -> Response {
    record_request("requests");

    let result = match page_limit(non_empty(&params.limit), state.config.page_size) {
        Ok(limit) => {
            state
                .artifacts
                .list_requests(non_empty(&params.date_prefix), limit, non_empty(&params.next))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list requests");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: StatusDocument,
}

/// GET /api/requests/:request/status
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Response {
    record_request("request_status");
    let result = state
        .artifacts
        .request_status(&request_id)
        .await
        .map(|mut status| {
            // Older launchers did not record tallies.
            status.counts = Some(status.run_counts());
            StatusBody { status }
        });
    reply(&request_id, None, result, OnError::Embed)
}

#[derive(Serialize)]
struct InputBody {
    input: serde_json::Value,
}

/// GET /api/requests/:request/input
///
/// The request input is returned as a JSON document, not a file payload.
pub async fn input_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Response {
    record_request("request_input");
    let result = match state.artifacts.request_input(&request_id).await {
        Ok(payload) => parse_document(&request_id, payload).map(|input| InputBody { input }),
        Err(e) => Err(e),
    };
    reply(&request_id, None, result, OnError::Embed)
}

fn parse_document(request_id: &str, payload: FilePayload) -> Result<serde_json::Value, AdminError> {
    serde_json::from_slice(&payload.contents).map_err(|e| AdminError::InvalidDocument {
        key: Artifact::RequestInput { request_id }.key(),
        message: e.to_string(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlueskyConfigBody {
    bluesky_config: FilePayload,
}

/// GET /api/requests/:request/bluesky-config
pub async fn bluesky_config_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Response {
    record_request("bluesky_config");
    let result = state
        .artifacts
        .bluesky_config(&request_id)
        .await
        .map(|bluesky_config| BlueskyConfigBody { bluesky_config });
    reply(&request_id, None, result, OnError::Status)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlueskyAwsConfigBody {
    bluesky_aws_config: FilePayload,
}

/// GET /api/requests/:request/bluesky-aws-config
pub async fn bluesky_aws_config_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Response {
    record_request("bluesky_aws_config");
    let result = state
        .artifacts
        .bluesky_aws_config(&request_id)
        .await
        .map(|bluesky_aws_config| BlueskyAwsConfigBody { bluesky_aws_config });
    reply(&request_id, None, result, OnError::Status)
}
