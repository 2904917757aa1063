//! Local materialization of per-run output archives.
//!
//! Output archives are `{output_path}/{request_id}/{run_id}.tar.gz` and
//! contain a single top-level `{run_id}/` directory. They are unpacked next
//! to the cached archive, at `{cache_root}/{bucket}/{output_path}/{request_id}/{run_id}`,
//! and the unpacked directory is reused for every later request. Nothing is
//! re-extracted if the remote archive changes afterwards.

use bytes::Bytes;
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tar::Archive;
use tracing::{debug, info, warn};

use bluesky_common::{AdminError, AdminResult, FilePayload, OutputFileTree};

use crate::artifacts::ArtifactStore;
use crate::file_cache::FileCache;
use crate::file_tree;
use crate::keys::{join_key, validate_id, Artifact};

/// Downloads, unpacks and serves run output archives.
pub struct OutputArchives {
    artifacts: Arc<ArtifactStore>,
    layout: FileCache,
    output_path: String,
}

impl OutputArchives {
    /// `cache_root` must be the same root the accessor caches into, so the
    /// archive and its unpacked directory sit side by side.
    pub fn new(
        artifacts: Arc<ArtifactStore>,
        cache_root: impl AsRef<Path>,
        output_path: impl Into<String>,
    ) -> Self {
        let layout = FileCache::new(cache_root, artifacts.bucket());
        Self {
            artifacts,
            layout,
            output_path: output_path.into(),
        }
    }

    fn artifact<'a>(&'a self, request_id: &'a str, run_id: &'a str) -> Artifact<'a> {
        Artifact::RunOutput {
            output_path: &self.output_path,
            request_id,
            run_id,
        }
    }

    /// Where the run's output is unpacked.
    pub fn unpacked_dir(&self, request_id: &str, run_id: &str) -> PathBuf {
        self.layout
            .path_for(&join_key(&[self.output_path.as_str(), request_id, run_id]))
    }

    /// Ensure the run's output is unpacked locally and return its root.
    pub async fn materialize(&self, request_id: &str, run_id: &str) -> AdminResult<PathBuf> {
        validate_id("request", request_id)?;
        validate_id("run", run_id)?;

        let unpacked = self.unpacked_dir(request_id, run_id);
        if is_dir(&unpacked).await {
            debug!(dir = %unpacked.display(), "Reusing unpacked output");
            return Ok(unpacked);
        }

        let artifact = self.artifact(request_id, run_id);
        let key = artifact.key();
        let data = self.artifacts.fetch_artifact(&artifact).await?;

        let parent = unpacked
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| AdminError::Internal(format!("No parent for {}", unpacked.display())))?;
        let run_dir = run_id.to_string();

        let extracted = tokio::task::spawn_blocking(move || extract_into(data, &parent, &run_dir))
            .await
            .map_err(|e| AdminError::Internal(format!("Extraction task failed: {}", e)))?;

        if let Err(message) = extracted {
            return Err(AdminError::ExtractionFailed { key, message });
        }
        if !is_dir(&unpacked).await {
            return Err(AdminError::ExtractionFailed {
                key,
                message: format!("archive has no top-level '{}' directory", run_id),
            });
        }

        metrics::counter!("output_archive_extractions_total").increment(1);
        info!(key = %key, dir = %unpacked.display(), "Unpacked output archive");
        Ok(unpacked)
    }

    /// Recursive listing of the run's output.
    pub async fn list_files(&self, request_id: &str, run_id: &str) -> AdminResult<OutputFileTree> {
        let root = self.materialize(request_id, run_id).await?;
        tokio::task::spawn_blocking(move || file_tree::list_files(&root))
            .await
            .map_err(|e| AdminError::Internal(format!("Listing task failed: {}", e)))?
    }

    /// One file of the run's output, addressed relative to its root.
    pub async fn read_file(
        &self,
        request_id: &str,
        run_id: &str,
        name: &str,
    ) -> AdminResult<FilePayload> {
        // Reject bad names before paying for a download.
        file_tree::resolve_file(Path::new(""), name)?;
        let root = self.materialize(request_id, run_id).await?;
        file_tree::read_file(&root, name).await
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Unpack a gzipped tarball into a scratch directory inside `parent`, then
/// move its `run_dir` into place.
///
/// Only regular files and directories are unpacked; symlinks, hard links
/// and special files are skipped.
///
/// Readers only ever see a fully unpacked directory. If a concurrent
/// request won the rename the existing directory is kept.
fn extract_into(data: Bytes, parent: &Path, run_dir: &str) -> Result<(), String> {
    std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    let scratch = tempfile::Builder::new()
        .prefix(".unpack-")
        .tempdir_in(parent)
        .map_err(|e| e.to_string())?;

    let mut archive = Archive::new(GzDecoder::new(&data[..]));
    for entry in archive.entries().map_err(|e| e.to_string())? {
        let mut entry = entry.map_err(|e| e.to_string())?;
        let entry_type = entry.header().entry_type();
        // Links could point outside the output directory.
        if !(entry_type.is_file() || entry_type.is_dir()) {
            let path = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            warn!(path = %path, entry_type = ?entry_type, "Skipping archive entry");
            continue;
        }
        entry.unpack_in(scratch.path()).map_err(|e| e.to_string())?;
    }

    let staged = scratch.path().join(run_dir);
    if !staged.is_dir() {
        // Leave the target absent; the caller reports the missing directory.
        return Ok(());
    }

    let target = parent.join(run_dir);
    match std::fs::rename(&staged, &target) {
        Ok(()) => Ok(()),
        Err(_) if target.is_dir() => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}
