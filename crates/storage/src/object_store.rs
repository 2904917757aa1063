//! Object storage interface for pipeline artifacts (S3 compatible).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};

use bluesky_common::{AdminError, AdminResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// Bucket name
    pub bucket: String,
    /// Custom endpoint URL (MinIO, localstack); AWS when unset
    pub endpoint: Option<String>,
    /// AWS region
    pub region: String,
    /// Allow HTTP (for local endpoints)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: "bluesky-aws".to_string(),
            endpoint: None,
            region: "us-west-2".to_string(),
            allow_http: false,
        }
    }
}

/// Key and modification time of a listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Last key of this page when more keys follow.
    pub last_key: Option<String>,
}

/// Object storage client for one bucket.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    reads: AtomicU64,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    ///
    /// Credentials are taken from the standard `AWS_*` environment.
    pub fn new(config: &ObjectStorageConfig) -> AdminResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| AdminError::Config(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self::from_store(Arc::new(store), &config.bucket))
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory`.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            reads: AtomicU64::new(0),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Number of object reads issued against the store.
    pub fn remote_reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Read the full object at `key`.
    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    pub async fn get(&self, key: &str) -> AdminResult<Bytes> {
        let location = Path::from(key);
        self.reads.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("object_store_reads_total").increment(1);
        debug!("Fetching object");

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| map_store_error(key, e))?;

        let bytes = result.bytes().await.map_err(|e| map_store_error(key, e))?;

        metrics::counter!("object_store_read_bytes_total").increment(bytes.len() as u64);
        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// List up to `limit` keys that start with the raw string `prefix`,
    /// strictly after `start_after`.
    ///
    /// `object_store` prefixes match whole path segments, so the listing
    /// runs over the enclosing directory starting at `prefix` and stops at
    /// the first key outside it. This relies on the store returning keys in
    /// lexicographic order, which S3 and the in-memory store do.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn list_page(
        &self,
        prefix: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> AdminResult<ListPage> {
        let dir = prefix.rfind('/').map(|i| &prefix[..i]).unwrap_or("");
        let dir_path = (!dir.is_empty()).then(|| Path::from(dir));
        let offset = match start_after {
            Some(key) if key > prefix => key,
            _ => prefix,
        };
        let offset_path = Path::from(offset);

        let mut stream = self.store.list_with_offset(dir_path.as_ref(), &offset_path);
        let mut objects = Vec::with_capacity(limit + 1);

        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| AdminError::ListFailed(e.to_string()))?
        {
            let key = meta.location.to_string();
            if key.as_str() <= offset {
                continue;
            }
            if !key.starts_with(prefix) {
                break;
            }
            objects.push(ObjectSummary {
                key,
                last_modified: meta.last_modified,
            });
            if objects.len() > limit {
                break;
            }
        }

        let last_key = if objects.len() > limit {
            objects.truncate(limit);
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };

        debug!(count = objects.len(), more = last_key.is_some(), "Listed objects");
        Ok(ListPage { objects, last_key })
    }
}

fn map_store_error(key: &str, err: object_store::Error) -> AdminError {
    match err {
        object_store::Error::NotFound { .. } => AdminError::NotFound {
            key: key.to_string(),
        },
        other => AdminError::FetchFailed {
            key: key.to_string(),
            message: other.to_string(),
        },
    }
}
