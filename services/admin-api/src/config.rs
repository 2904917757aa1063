//! Service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use storage::ObjectStorageConfig;

/// Default number of requests per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Runtime configuration of the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bucket holding the pipeline artifacts.
    pub storage: ObjectStorageConfig,

    /// Root of the local file cache. Caching and output browsing are
    /// disabled when unset.
    pub cache_root: Option<PathBuf>,

    /// Bucket prefix of run output archives.
    pub output_path: String,

    /// Requests per listing page when the caller gives no limit.
    pub page_size: usize,

    /// Links to published outputs.
    pub output_links: OutputLinks,

    /// Prefix the API is mounted under, e.g. `/bsaa`.
    pub base_path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            storage: ObjectStorageConfig::default(),
            cache_root: None,
            output_path: "output".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            output_links: OutputLinks::default(),
            base_path: String::new(),
        }
    }
}

impl AdminConfig {
    /// Mount point normalized to `/segment[/segment]`, or `None` for root.
    pub fn mount_path(&self) -> Option<String> {
        let trimmed = self.base_path.trim_matches('/');
        (!trimmed.is_empty()).then(|| format!("/{}", trimmed))
    }
}

/// Where published run outputs and the external viewer live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputLinks {
    /// Web endpoint serving unpacked outputs, e.g. `https://host/bluesky-output`.
    pub output_endpoint: Option<String>,

    /// Path inside a run's output where BlueSky writes its results.
    pub output_path_prefix: Option<String>,

    /// Viewer URL with a `{url}` placeholder for the output URL.
    pub viewer_url_template: Option<String>,
}

impl OutputLinks {
    /// `{endpoint}/{request}/{run}/{prefix}` when an endpoint is configured.
    pub fn output_url(&self, request_id: &str, run_id: &str) -> Option<String> {
        let endpoint = self.output_endpoint.as_deref()?;
        let mut url = endpoint.trim_end_matches('/').to_string();
        let segments = [
            Some(request_id),
            Some(run_id),
            self.output_path_prefix.as_deref(),
        ];
        for segment in segments.into_iter().flatten() {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        Some(url)
    }

    /// Viewer link for an output URL.
    pub fn viewer_url(&self, output_url: &str) -> Option<String> {
        self.viewer_url_template
            .as_deref()
            .map(|template| template.replace("{url}", output_url))
    }
}
