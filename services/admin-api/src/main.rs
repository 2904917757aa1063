//! BlueSky Admin API Server
//!
//! Serves pipeline status, configuration, logs and output files to the
//! admin dashboard.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use admin_api::config::{AdminConfig, OutputLinks};
use admin_api::state::AppState;
use storage::ObjectStorageConfig;

/// BlueSky Admin API Server
#[derive(Parser, Debug)]
#[command(name = "admin-api")]
#[command(about = "Read-only API over BlueSky pipeline requests, runs and outputs")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000", env = "ADMIN_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Bucket holding the pipeline artifacts
    #[arg(long, env = "S3_BUCKET")]
    bucket: String,

    /// Custom S3 endpoint (MinIO, localstack)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, default_value = "us-west-2", env = "AWS_REGION")]
    s3_region: String,

    /// Allow plain HTTP to the S3 endpoint
    #[arg(long, env = "S3_ALLOW_HTTP")]
    allow_http: bool,

    /// Local file cache root; caching and output browsing are off without it
    #[arg(long, env = "FILE_CACHE_ROOT")]
    cache_root: Option<PathBuf>,

    /// Bucket prefix of run output archives
    #[arg(long, default_value = "output", env = "S3_OUTPUT_PATH")]
    output_path: String,

    /// Requests per listing page
    #[arg(long, default_value_t = admin_api::config::DEFAULT_PAGE_SIZE, env = "REQUESTS_PAGE_SIZE")]
    page_size: usize,

    /// Web endpoint serving unpacked run outputs
    #[arg(long, env = "OUTPUT_ENDPOINT")]
    output_endpoint: Option<String>,

    /// Path of BlueSky's results inside a run's output
    #[arg(long, env = "BLUESKY_OUTPUT_PATH_PREFIX")]
    output_path_prefix: Option<String>,

    /// Viewer URL with a `{url}` placeholder
    #[arg(long, env = "VIEWER_URL_TEMPLATE")]
    viewer_url_template: Option<String>,

    /// Path prefix the API is mounted under
    #[arg(long, default_value = "", env = "ADMIN_BASE_PATH")]
    base_path: String,
}

impl Args {
    fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            storage: ObjectStorageConfig {
                bucket: self.bucket.clone(),
                endpoint: self.s3_endpoint.clone(),
                region: self.s3_region.clone(),
                allow_http: self.allow_http,
            },
            cache_root: self.cache_root.clone(),
            output_path: self.output_path.clone(),
            page_size: self.page_size,
            output_links: OutputLinks {
                output_endpoint: self.output_endpoint.clone(),
                output_path_prefix: self.output_path_prefix.clone(),
                viewer_url_template: self.viewer_url_template.clone(),
            },
            base_path: self.base_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!(bucket = %args.bucket, "Starting BlueSky admin API");

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = AppState::new(args.admin_config())
        .context("Failed to initialize application state")?
        .with_prometheus(prometheus);
    let app = admin_api::build_router(Arc::new(state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", args.listen))?;

    info!("Admin API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
