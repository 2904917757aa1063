//! Application state for the admin API.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{info, warn};

use storage::{ArtifactStore, ObjectStorage, OutputArchives};

use crate::config::AdminConfig;

/// Shared application state.
pub struct AppState {
    pub config: AdminConfig,

    /// Accessor for request and run artifacts.
    pub artifacts: Arc<ArtifactStore>,

    /// Output archive materializer; absent without a cache root.
    pub outputs: Option<OutputArchives>,

    /// Renders `/metrics` when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Connect to the configured bucket.
    pub fn new(config: AdminConfig) -> Result<Self> {
        let storage = Arc::new(ObjectStorage::new(&config.storage)?);
        Ok(Self::with_storage(config, storage))
    }

    /// Build state around an existing storage client.
    pub fn with_storage(config: AdminConfig, storage: Arc<ObjectStorage>) -> Self {
        let artifacts = Arc::new(match &config.cache_root {
            Some(root) => ArtifactStore::with_file_cache(storage, root),
            None => ArtifactStore::new(storage),
        });

        let outputs = match &config.cache_root {
            Some(root) => {
                info!(
                    cache_root = %root.display(),
                    output_path = %config.output_path,
                    "File cache enabled"
                );
                Some(OutputArchives::new(
                    artifacts.clone(),
                    root,
                    config.output_path.clone(),
                ))
            }
            None => {
                warn!("No file cache root configured; output files cannot be browsed");
                None
            }
        };

        Self {
            config,
            artifacts,
            outputs,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
