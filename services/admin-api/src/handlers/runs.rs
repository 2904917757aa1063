//! Run-level artifacts: input, log and unpacked output files.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use serde::{Deserialize, Serialize};

use bluesky_common::{AdminError, AdminResult, FilePayload, OutputFileTree};
use storage::OutputArchives;

use super::{record_request, reply, OnError};
use crate::state::AppState;

#[derive(Serialize)]
struct FileBody {
    file: FilePayload,
}

#[derive(Serialize)]
struct LogBody {
    log: String,
    file: FilePayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputFilesBody {
    output_files: OutputFileTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewer_url: Option<String>,
}

/// Query parameters for `GET .../output-files/file`.
#[derive(Debug, Default, Deserialize)]
pub struct OutputFileQuery {
    pub name: Option<String>,
}

fn outputs(state: &AppState) -> AdminResult<&OutputArchives> {
    state
        .outputs
        .as_ref()
        .ok_or_else(|| AdminError::Config("file cache root not configured".to_string()))
}

/// GET /api/requests/:request/runs/:run/input
pub async fn run_input_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((request_id, run_id)): Path<(String, String)>,
) -> Response {
    record_request("run_input");
    let result = state
        .artifacts
        .run_input(&request_id, &run_id)
        .await
        .map(|file| FileBody { file });
    reply(&request_id, Some(&run_id), result, OnError::Status)
}

/// GET /api/requests/:request/runs/:run/log
pub async fn run_log_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((request_id, run_id)): Path<(String, String)>,
) -> Response {
    record_request("run_log");
    let result = state
        .artifacts
        .run_log(&request_id, &run_id)
        .await
        .map(|file| LogBody {
            log: file.text(),
            file,
        });
    reply(&request_id, Some(&run_id), result, OnError::Status)
}

/// GET /api/requests/:request/runs/:run/output-files
///
/// Unpacks the run's output archive on first use and lists it.
pub async fn output_files_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((request_id, run_id)): Path<(String, String)>,
) -> Response {
    record_request("output_files");
    let result = match outputs(&state) {
        Ok(outputs) => outputs.list_files(&request_id, &run_id).await,
        Err(e) => Err(e),
    };
    let result = result.map(|output_files| {
        let links = &state.config.output_links;
        let output_url = links.output_url(&request_id, &run_id);
        let viewer_url = output_url.as_deref().and_then(|url| links.viewer_url(url));
        OutputFilesBody {
            output_files,
            output_url,
            viewer_url,
        }
    });
    reply(&request_id, Some(&run_id), result, OnError::Status)
}

/// GET /api/requests/:request/runs/:run/output-files/file?name=...
pub async fn output_file_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((request_id, run_id)): Path<(String, String)>,
    Query(params): Query<OutputFileQuery>,
) -> Response {
    record_request("output_file");
    let result = match params.name.as_deref().filter(|n| !n.is_empty()) {
        None => Err(AdminError::MissingParameter("name".to_string())),
        Some(name) => match outputs(&state) {
            Ok(outputs) => outputs.read_file(&request_id, &run_id, name).await,
            Err(e) => Err(e),
        },
    };
    reply(
        &request_id,
        Some(&run_id),
        result.map(|file| FileBody { file }),
        OnError::Status,
    )
}
