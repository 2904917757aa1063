//! Write-once local file cache for bucket objects.
//!
//! Objects are mirrored at `{root}/{bucket}/{key}`. A file at that path is
//! treated as authoritative: there is no TTL and no checksum check.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keyed blob cache consulted before the object store.
#[async_trait]
pub trait BlobCache: Send + Sync {
    /// Cached bytes for `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Store `data` under `key`.
    async fn put(&self, key: &str, data: &[u8]) -> io::Result<()>;
}

/// Filesystem-backed [`BlobCache`] scoped to one bucket.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Cache for `bucket` under `cache_root`.
    pub fn new(cache_root: impl AsRef<Path>, bucket: &str) -> Self {
        Self {
            dir: cache_root.as_ref().join(bucket),
        }
    }

    /// Local path mirroring `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.dir.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl BlobCache for FileCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(path = %path.display(), size = data.len(), "File cache hit");
                Some(Bytes::from(data))
            }
            Err(_) => None,
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), size = data.len(), "Wrote file cache entry");
        Ok(())
    }
}
