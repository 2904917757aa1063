//! BlueSky Admin API Service Library
//!
//! Read-only JSON API over the requests, runs and artifacts a BlueSky
//! pipeline leaves in its bucket.

pub mod config;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the full application router.
///
/// API routes are nested under the configured mount path; `/health` and
/// `/metrics` always stay at the root.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // Requests
        .route(
            "/api/requests",
            get(handlers::requests::list_requests_handler),
        )
        .route(
            "/api/requests/:request/status",
            get(handlers::requests::status_handler),
        )
        .route(
            "/api/requests/:request/input",
            get(handlers::requests::input_handler),
        )
        .route(
            "/api/requests/:request/bluesky-config",
            get(handlers::requests::bluesky_config_handler),
        )
        .route(
            "/api/requests/:request/bluesky-aws-config",
            get(handlers::requests::bluesky_aws_config_handler),
        )
        // Runs
        .route(
            "/api/requests/:request/runs/:run/input",
            get(handlers::runs::run_input_handler),
        )
        .route(
            "/api/requests/:request/runs/:run/log",
            get(handlers::runs::run_log_handler),
        )
        .route(
            "/api/requests/:request/runs/:run/output-files",
            get(handlers::runs::output_files_handler),
        )
        .route(
            "/api/requests/:request/runs/:run/output-files/file",
            get(handlers::runs::output_file_handler),
        );

    let app = match state.config.mount_path() {
        Some(mount) => Router::new().nest(&mount, api),
        None => api,
    };

    app
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
