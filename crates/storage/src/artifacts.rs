//! Typed access to request and run artifacts.
//!
//! Every read goes through [`ArtifactStore::fetch`], which consults the
//! local [`BlobCache`] first for cacheable artifacts and mirrors fetched
//! objects into it afterwards. Cache writes are best effort.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as TOKEN_ENCODING, Engine};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use bluesky_common::{
    AdminError, AdminResult, FilePayload, RequestPage, RequestSummary, StatusDocument,
};

use crate::file_cache::{BlobCache, FileCache};
use crate::keys::{request_id_from_index_key, request_index_prefix, validate_id, Artifact};
use crate::object_store::ObjectStorage;
use crate::redact::redact_aws_config;

/// Largest page the request listing will return.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Whether a fetch may use the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve from the cache when present and populate it on a miss.
    ReadWrite,
    /// Always go to the store.
    Bypass,
}

impl CachePolicy {
    pub fn for_artifact(artifact: &Artifact<'_>) -> Self {
        if artifact.cacheable() {
            CachePolicy::ReadWrite
        } else {
            CachePolicy::Bypass
        }
    }
}

/// Accessor for BlueSky artifacts in one bucket.
pub struct ArtifactStore {
    storage: Arc<ObjectStorage>,
    cache: Option<Arc<dyn BlobCache>>,
}

impl ArtifactStore {
    /// Accessor without a local cache.
    pub fn new(storage: Arc<ObjectStorage>) -> Self {
        Self {
            storage,
            cache: None,
        }
    }

    /// Accessor mirroring objects under `{cache_root}/{bucket}`.
    pub fn with_file_cache(storage: Arc<ObjectStorage>, cache_root: impl AsRef<Path>) -> Self {
        let cache = FileCache::new(cache_root, storage.bucket());
        Self::with_cache(storage, Arc::new(cache))
    }

    /// Accessor with a custom cache implementation.
    pub fn with_cache(storage: Arc<ObjectStorage>, cache: Arc<dyn BlobCache>) -> Self {
        Self {
            storage,
            cache: Some(cache),
        }
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    /// Raw bytes at `key`.
    pub async fn fetch(&self, key: &str, policy: CachePolicy) -> AdminResult<Bytes> {
        let cache = match (&self.cache, policy) {
            (Some(cache), CachePolicy::ReadWrite) => Some(cache),
            _ => None,
        };

        if let Some(cache) = cache {
            if let Some(data) = cache.get(key).await {
                metrics::counter!("file_cache_hits_total").increment(1);
                return Ok(data);
            }
            metrics::counter!("file_cache_misses_total").increment(1);
        }

        let data = self.storage.get(key).await.map_err(|e| {
            match &e {
                AdminError::FetchFailed { message, .. } => {
                    warn!(key = %key, error = %message, "Object fetch failed")
                }
                other => debug!(key = %key, error = %other, "Object fetch failed"),
            }
            e
        })?;

        if let Some(cache) = cache {
            if let Err(e) = cache.put(key, &data).await {
                metrics::counter!("file_cache_write_failures_total").increment(1);
                warn!(key = %key, error = %e, "Failed to write object to file cache");
            }
        }

        Ok(data)
    }

    /// Bytes of `artifact`, cached according to its kind.
    pub async fn fetch_artifact(&self, artifact: &Artifact<'_>) -> AdminResult<Bytes> {
        self.fetch(&artifact.key(), CachePolicy::for_artifact(artifact))
            .await
    }

    async fn fetch_payload(&self, artifact: Artifact<'_>) -> AdminResult<FilePayload> {
        let data = self.fetch_artifact(&artifact).await?;
        Ok(FilePayload::new(artifact.file_name(), data.to_vec()))
    }

    /// Parsed status document of a request. Never cached.
    pub async fn request_status(&self, request_id: &str) -> AdminResult<StatusDocument> {
        validate_id("request", request_id)?;
        let artifact = Artifact::RequestStatus { request_id };
        let data = self.fetch_artifact(&artifact).await?;
        StatusDocument::from_slice(&data).map_err(|e| AdminError::InvalidDocument {
            key: artifact.key(),
            message: e.to_string(),
        })
    }

    /// The request as submitted.
    pub async fn request_input(&self, request_id: &str) -> AdminResult<FilePayload> {
        validate_id("request", request_id)?;
        self.fetch_payload(Artifact::RequestInput { request_id })
            .await
    }

    /// Run-level bluesky configuration.
    pub async fn bluesky_config(&self, request_id: &str) -> AdminResult<FilePayload> {
        validate_id("request", request_id)?;
        self.fetch_payload(Artifact::BlueskyConfig { request_id })
            .await
    }

    /// Deployment configuration with credentials and account ids replaced.
    pub async fn bluesky_aws_config(&self, request_id: &str) -> AdminResult<FilePayload> {
        validate_id("request", request_id)?;
        let artifact = Artifact::BlueskyAwsConfig { request_id };
        let data = self.fetch_artifact(&artifact).await?;

        let invalid = |e: serde_json::Error| AdminError::InvalidDocument {
            key: artifact.key(),
            message: e.to_string(),
        };
        let mut config: serde_json::Value = serde_json::from_slice(&data).map_err(invalid)?;
        let replaced = redact_aws_config(&mut config);
        debug!(request_id = %request_id, replaced, "Redacted bluesky-aws config");

        let contents = serde_json::to_vec(&config).map_err(invalid)?;
        Ok(FilePayload::new(artifact.file_name(), contents))
    }

    /// Log file of one run.
    pub async fn run_log(&self, request_id: &str, run_id: &str) -> AdminResult<FilePayload> {
        validate_id("request", request_id)?;
        validate_id("run", run_id)?;
        self.fetch_payload(Artifact::RunLog { request_id, run_id })
            .await
    }

    /// Input document of one run.
    pub async fn run_input(&self, request_id: &str, run_id: &str) -> AdminResult<FilePayload> {
        validate_id("request", request_id)?;
        validate_id("run", run_id)?;
        self.fetch_payload(Artifact::RunInput { request_id, run_id })
            .await
    }

    /// One page of the request index.
    ///
    /// `next` is the token returned with the previous page. Keys come back
    /// in the store's lexicographic order.
    pub async fn list_requests(
        &self,
        date_prefix: Option<&str>,
        limit: usize,
        next: Option<&str>,
    ) -> AdminResult<RequestPage> {
        let prefix = request_index_prefix(date_prefix);
        let start_after = next.map(decode_token).transpose()?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        debug!(bucket = %self.bucket(), prefix = %prefix, limit, "Listing requests");
        let page = self
            .storage
            .list_page(&prefix, start_after.as_deref(), limit)
            .await?;

        let requests = page
            .objects
            .into_iter()
            .map(|o| RequestSummary {
                request_id: request_id_from_index_key(&o.key).to_string(),
                ts: o.last_modified,
            })
            .collect();

        Ok(RequestPage {
            requests,
            next: page.last_key.as_deref().map(encode_token),
        })
    }
}

fn encode_token(key: &str) -> String {
    TOKEN_ENCODING.encode(key)
}

fn decode_token(token: &str) -> AdminResult<String> {
    TOKEN_ENCODING
        .decode(token)
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .ok_or_else(|| AdminError::invalid("next", "malformed continuation token"))
}
