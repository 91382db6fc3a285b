use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::size::file_extension;
use crate::{GLOBAL_UPLOAD_LIMIT, TransferError};

/// Attributes of a candidate file, as the user selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    /// Declared MIME type; empty when the source did not provide one.
    #[serde(default)]
    pub mime_type: String,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// A file held in memory, ready to be uploaded.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub info: FileInfo,
    pub data: Bytes,
}

impl LocalFile {
    /// Wraps in-memory content. The size is taken from `data`.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            info: FileInfo::new(name, data.len() as u64, mime_type),
            data,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, TransferError> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }

    pub fn mime_type(&self) -> &str {
        &self.info.mime_type
    }
}

/// Upload rules for one category of files.
///
/// Extensions are stored lower-cased without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeRule {
    category: String,
    display_name: String,
    extensions: Vec<String>,
    mime_types: Vec<String>,
    max_size_bytes: u64,
}

impl FileTypeRule {
    /// Builds a rule, normalizing extensions (`".JPG"` → `"jpg"`).
    ///
    /// Both the extension and MIME lists must be non-empty.
    pub fn new(
        category: impl Into<String>,
        display_name: impl Into<String>,
        extensions: impl IntoIterator<Item = impl AsRef<str>>,
        mime_types: impl IntoIterator<Item = impl AsRef<str>>,
        max_size_bytes: u64,
    ) -> Result<Self, TransferError> {
        let category = category.into();
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        let mime_types: Vec<String> = mime_types
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();

        if extensions.is_empty() {
            return Err(TransferError::InvalidRule(format!(
                "{category}: no extensions"
            )));
        }
        if mime_types.is_empty() {
            return Err(TransferError::InvalidRule(format!(
                "{category}: no MIME types"
            )));
        }

        Ok(Self {
            category,
            display_name: display_name.into(),
            extensions,
            mime_types,
            max_size_bytes,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn matches_mime(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|m| m == mime_type)
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Ordered, immutable set of [`FileTypeRule`]s plus the global ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    rules: Vec<FileTypeRule>,
    upload_limit: u64,
}

impl TypeRegistry {
    /// Builds a registry. Every rule's limit must not exceed `upload_limit`.
    pub fn new(rules: Vec<FileTypeRule>, upload_limit: u64) -> Result<Self, TransferError> {
        if let Some(rule) = rules.iter().find(|r| r.max_size_bytes > upload_limit) {
            return Err(TransferError::InvalidRule(format!(
                "{}: limit {} exceeds upload ceiling {}",
                rule.category, rule.max_size_bytes, upload_limit
            )));
        }
        Ok(Self {
            rules,
            upload_limit,
        })
    }

    pub fn upload_limit(&self) -> u64 {
        self.upload_limit
    }

    pub fn rules(&self) -> &[FileTypeRule] {
        &self.rules
    }

    /// First rule, in registration order, that lists `mime_type`.
    pub fn rule_for_mime(&self, mime_type: &str) -> Option<&FileTypeRule> {
        self.rules.iter().find(|r| r.matches_mime(mime_type))
    }

    /// Category of the first rule whose extensions include the file's
    /// extension, or `"unknown"`.
    pub fn file_type(&self, filename: &str) -> &str {
        if filename.is_empty() {
            return "unknown";
        }
        let ext = file_extension(filename);
        self.rules
            .iter()
            .find(|r| r.allows_extension(&ext))
            .map(|r| r.category())
            .unwrap_or("unknown")
    }
}

impl Default for TypeRegistry {
    /// Images up to 10 MiB and PDF documents up to 20 MiB.
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            rules: vec![
                FileTypeRule {
                    category: "image".into(),
                    display_name: "Image".into(),
                    extensions: owned(&["jpg", "jpeg", "png", "gif", "webp"]),
                    mime_types: owned(&["image/jpeg", "image/png", "image/gif", "image/webp"]),
                    max_size_bytes: 10 * 1024 * 1024,
                },
                FileTypeRule {
                    category: "document".into(),
                    display_name: "PDF document".into(),
                    extensions: owned(&["pdf"]),
                    mime_types: owned(&["application/pdf"]),
                    max_size_bytes: 20 * 1024 * 1024,
                },
            ],
            upload_limit: GLOBAL_UPLOAD_LIMIT,
        }
    }
}
