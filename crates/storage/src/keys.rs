//! Bucket layout of the BlueSky pipeline.
//!
//! Every artifact lives at a key derived only from its request id, run id,
//! and (for output archives) the configured output prefix.

use bluesky_common::{AdminError, AdminResult};

/// Prefix under which the launcher indexes submitted requests as
/// `request-index/{YYYYMMDD}/{request_id}`.
pub const REQUEST_INDEX_PREFIX: &str = "request-index/";

/// An addressable artifact in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact<'a> {
    RequestStatus { request_id: &'a str },
    RequestInput { request_id: &'a str },
    BlueskyConfig { request_id: &'a str },
    BlueskyAwsConfig { request_id: &'a str },
    RunLog { request_id: &'a str, run_id: &'a str },
    RunInput { request_id: &'a str, run_id: &'a str },
    RunOutput {
        output_path: &'a str,
        request_id: &'a str,
        run_id: &'a str,
    },
}

impl<'a> Artifact<'a> {
    /// File name of the artifact, i.e. the last key segment.
    pub fn file_name(&self) -> String {
        match self {
            Artifact::RequestStatus { request_id } => format!("{}-status.json", request_id),
            Artifact::RequestInput { request_id } => format!("{}.json", request_id),
            Artifact::BlueskyConfig { request_id } => {
                format!("{}-config-bluesky.json", request_id)
            }
            Artifact::BlueskyAwsConfig { request_id } => {
                format!("{}-config-bluesky-aws.json", request_id)
            }
            Artifact::RunLog { run_id, .. } => format!("{}.log", run_id),
            Artifact::RunInput { run_id, .. } => format!("{}-input.json", run_id),
            Artifact::RunOutput { run_id, .. } => format!("{}.tar.gz", run_id),
        }
    }

    /// Full object key.
    pub fn key(&self) -> String {
        let name = self.file_name();
        match self {
            Artifact::RequestStatus { .. } => format!("status/{}", name),
            Artifact::RequestInput { .. } => format!("requests/{}", name),
            Artifact::BlueskyConfig { .. } | Artifact::BlueskyAwsConfig { .. } => {
                format!("config/{}", name)
            }
            Artifact::RunLog { request_id, .. } => format!("log/{}/{}", request_id, name),
            Artifact::RunInput { request_id, .. } => format!("input/{}/{}", request_id, name),
            Artifact::RunOutput {
                output_path,
                request_id,
                ..
            } => join_key(&[*output_path, *request_id, name.as_str()]),
        }
    }

    /// Whether the artifact may be served from the local file cache.
    ///
    /// Status documents change while runs progress; everything else is
    /// written once.
    pub fn cacheable(&self) -> bool {
        !matches!(self, Artifact::RequestStatus { .. })
    }
}

/// Join key segments with single slashes, skipping empty segments.
pub fn join_key(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Full listing prefix for an optional date prefix (e.g. `202001`).
pub fn request_index_prefix(date_prefix: Option<&str>) -> String {
    format!("{}{}", REQUEST_INDEX_PREFIX, date_prefix.unwrap_or(""))
}

/// Recover the request id from a request index key.
///
/// Strips `request-index/` and a following eight-digit date segment when
/// present.
pub fn request_id_from_index_key(key: &str) -> &str {
    let rest = key.strip_prefix(REQUEST_INDEX_PREFIX).unwrap_or(key);
    match rest.split_once('/') {
        Some((date, id)) if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) => id,
        _ => rest,
    }
}

/// Reject identifiers that would not map to a single key segment.
pub fn validate_id(param: &str, value: &str) -> AdminResult<()> {
    if value.is_empty() {
        return Err(AdminError::MissingParameter(param.to_string()));
    }
    if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
        return Err(AdminError::invalid(
            param,
            format!("'{}' is not a valid identifier", value),
        ));
    }
    Ok(())
}
