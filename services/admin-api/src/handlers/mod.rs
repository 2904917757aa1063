//! HTTP request handlers for the admin API.
//!
//! Every response carries the request (and run) it was asked about. Errors
//! are reported as `{request, run, error}`; routes that the dashboard polls
//! embed the error in a 200 response, the rest use the error's status code.

pub mod health;
pub mod requests;
pub mod runs;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::warn;

use bluesky_common::AdminResult;

#[derive(Serialize)]
struct Envelope<'a, T> {
    request: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<&'a str>,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// How a failed lookup is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnError {
    /// 200 with the error in the body.
    Embed,
    /// The error's own HTTP status.
    Status,
}

/// Wrap `result` in the `{request, run, ...}` envelope.
pub(crate) fn reply<T: Serialize>(
    request: &str,
    run: Option<&str>,
    result: AdminResult<T>,
    on_error: OnError,
) -> Response {
    match result {
        Ok(body) => Json(Envelope { request, run, body }).into_response(),
        Err(e) => {
            warn!(request = %request, run = ?run, error = %e, "Request failed");
            let status = match on_error {
                OnError::Embed => StatusCode::OK,
                OnError::Status => StatusCode::from_u16(e.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            };
            let body = ErrorBody {
                error: e.to_string(),
            };
            (status, Json(Envelope { request, run, body })).into_response()
        }
    }
}

fn record_request(route: &'static str) {
    metrics::counter!("admin_api_requests_total", "route" => route).increment(1);
}
