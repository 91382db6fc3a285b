use serde::{Deserialize, Serialize};

/// Body of the metadata registration POST.
///
/// The server expects exactly these three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRequest {
    pub url: String,
    pub mimetype: String,
    pub size: u64,
}

/// Normalized description of an uploaded file.
///
/// A descriptor is only usable when `url` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, rename = "size", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl FileDescriptor {
    /// Returns `true` if the descriptor points at a retrievable location.
    pub fn is_usable(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Caller-supplied fallback values, derived from the local file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFileDescriptor {
    pub id: Option<String>,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub original_filename: Option<String>,
    pub mimetype: Option<String>,
    pub size_bytes: Option<u64>,
}
