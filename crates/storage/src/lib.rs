//! Storage layer for the BlueSky admin services.
//!
//! Provides:
//! - Object storage (S3) reads and paginated prefix listings
//! - A write-once local file cache for fetched objects
//! - Typed accessors for request and run artifacts
//! - Materialization of per-run output archives

pub mod archive;
pub mod artifacts;
pub mod file_cache;
pub mod file_tree;
pub mod keys;
pub mod object_store;
pub mod redact;

pub use self::object_store::{ListPage, ObjectStorage, ObjectStorageConfig, ObjectSummary};
pub use archive::OutputArchives;
pub use artifacts::{ArtifactStore, CachePolicy};
pub use file_cache::{BlobCache, FileCache};
pub use keys::Artifact;
