//! Shared test utilities for the BlueSky admin workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Sample status, input and config documents
//! - A builder for `.tar.gz` run output archives
//! - An in-memory bucket seeded with a complete request
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, SeededBucket};
//! ```

pub mod archives;
pub mod bucket;
pub mod fixtures;

pub use archives::{build_archive_with_links, build_output_archive, sample_output_files};
pub use bucket::SeededBucket;
pub use fixtures::*;
