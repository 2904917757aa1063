//! Request status documents written by the BlueSky launcher.
//!
//! The launcher stores one JSON document per request under
//! `status/{request_id}-status.json`. Fields this crate does not model are
//! kept in the `extra` maps so a document survives a round trip through the
//! API unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Overall state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    Waiting,
    Running,
    Complete,
    #[serde(other)]
    Unknown,
}

/// State of a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Waiting,
    Running,
    Success,
    Failure,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Location and size of the fire a run models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Area in acres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One run of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_info: Option<FireInfo>,
    /// Set by the launcher only once the log object exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    /// Set by the launcher only once the output archive exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-status run tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    #[serde(default)]
    pub waiting: u32,
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub success: u32,
    #[serde(default)]
    pub failure: u32,
    #[serde(default)]
    pub unknown: u32,
}

impl RunCounts {
    fn record(&mut self, status: RunStatus) {
        match status {
            RunStatus::Waiting => self.waiting += 1,
            RunStatus::Running => self.running += 1,
            RunStatus::Success => self.success += 1,
            RunStatus::Failure => self.failure += 1,
            RunStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.waiting + self.running + self.success + self.failure + self.unknown
    }
}

/// Status document for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_state: Option<SystemState>,
    #[serde(default)]
    pub system_error: Option<String>,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default)]
    pub runs: BTreeMap<String, Run>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<RunCounts>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusDocument {
    /// Parse a status document from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Look up a run by id.
    pub fn run(&self, run_id: &str) -> Option<&Run> {
        self.runs.get(run_id)
    }

    /// Tallies from the document, or computed from `runs` when the launcher
    /// did not record them.
    pub fn run_counts(&self) -> RunCounts {
        if let Some(counts) = self.counts {
            return counts;
        }
        let mut counts = RunCounts::default();
        for run in self.runs.values() {
            counts.record(run.status);
        }
        counts
    }
}
