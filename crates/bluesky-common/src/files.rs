//! File payloads and extracted output listings.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Serialize, Serializer};

/// A single artifact returned to the dashboard.
///
/// `contents` goes over the wire base64-encoded so binary outputs
/// (images, archives) survive JSON transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePayload {
    pub name: String,
    #[serde(serialize_with = "serialize_base64")]
    pub contents: Vec<u8>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Contents as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }

    /// Contents as they appear in the JSON response.
    pub fn encoded_contents(&self) -> String {
        BASE64.encode(&self.contents)
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

/// Recursive listing of an extracted output archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputFileTree {
    pub name: String,
    pub files: Vec<String>,
    pub dirs: Vec<OutputFileTree>,
    /// Set when this directory could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutputFileTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Number of files in this directory and all subdirectories.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(|d| d.file_count()).sum::<usize>()
    }

    /// Find a direct subdirectory by name.
    pub fn dir(&self, name: &str) -> Option<&OutputFileTree> {
        self.dirs.iter().find(|d| d.name == name)
    }
}
