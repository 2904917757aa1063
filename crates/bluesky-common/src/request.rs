//! Request index listing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the request index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub request_id: String,
    /// Last-modified time of the index object.
    pub ts: DateTime<Utc>,
}

/// A page of the request index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPage {
    pub requests: Vec<RequestSummary>,
    /// Opaque continuation token; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl RequestPage {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}
