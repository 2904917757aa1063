//! Common types shared by the BlueSky admin crates.

pub mod error;
pub mod files;
pub mod request;
pub mod status;

pub use error::{AdminError, AdminResult};
pub use files::{FilePayload, OutputFileTree};
pub use request::{RequestPage, RequestSummary};
pub use status::{FireInfo, Run, RunCounts, RunStatus, StatusDocument, SystemState};
