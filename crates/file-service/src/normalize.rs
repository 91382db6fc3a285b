//! Turns a metadata server response into a [`FileDescriptor`].
//!
//! Servers have wrapped the file record in different envelopes over time.
//! Each [`UnwrapStrategy`] knows one of them; the first strategy that
//! finds an object wins, and its fields are merged with caller-supplied
//! fallbacks.

use filegate_protocol::{FileDescriptor, PartialFileDescriptor, ServerFileRecord};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwrapStrategy {
    /// `{ "file": { ... } }`
    NestedFile,
    /// `{ "data": { ... } }`
    NestedData,
    /// The payload itself is the record.
    Flat,
}

impl UnwrapStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [Self; 3] = [Self::NestedFile, Self::NestedData, Self::Flat];

    /// Returns the record this strategy locates in `payload`, if any.
    ///
    /// Nested records must be non-empty objects; a flat payload only has
    /// to be an object.
    pub fn extract(self, payload: &Value) -> Option<&Value> {
        let candidate = match self {
            Self::NestedFile => payload.get("file")?,
            Self::NestedData => payload.get("data")?,
            Self::Flat => return payload.is_object().then_some(payload),
        };
        candidate
            .as_object()
            .filter(|obj| !obj.is_empty())
            .map(|_| candidate)
    }
}

/// Normalizes `payload`, filling gaps from `fallback`.
///
/// Returns `None` when no strategy finds an object.
pub fn normalize(payload: &Value, fallback: &PartialFileDescriptor) -> Option<FileDescriptor> {
    let record = UnwrapStrategy::ORDER
        .iter()
        .find_map(|strategy| strategy.extract(payload))
        .and_then(ServerFileRecord::from_value)?;

    let or_fallback = |primary: Option<&str>, default: &Option<String>| {
        primary.map(str::to_string).or_else(|| default.clone())
    };

    Some(FileDescriptor {
        id: or_fallback(record.id(), &fallback.id).unwrap_or_default(),
        url: or_fallback(record.url(), &fallback.url).unwrap_or_default(),
        filename: or_fallback(record.filename.as_deref(), &fallback.filename),
        original_filename: or_fallback(record.original_filename(), &fallback.original_filename),
        mimetype: or_fallback(record.mimetype(), &fallback.mimetype),
        size_bytes: record.size().or(fallback.size_bytes),
    })
}
