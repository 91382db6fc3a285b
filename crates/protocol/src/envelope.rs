use serde::Deserialize;
use serde_json::Value;

use crate::lenient;

/// Top-level response body of the metadata server.
///
/// Only the fields the client reacts to are modeled; the file record
/// itself is located by the normalizer's unwrap strategies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEnvelope {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub message: Option<String>,
}

impl ServerEnvelope {
    /// Reads the envelope fields from an arbitrary JSON value.
    ///
    /// Non-object payloads yield an empty envelope.
    pub fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }

    /// Returns `true` when the server explicitly reported `success: false`.
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

/// A file record as any known server version may spell it.
///
/// Each attribute has several historical spellings. The accessor methods
/// resolve them in a fixed precedence; the first present spelling wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerFileRecord {
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient::non_empty_string")]
    pub underscore_id: Option<String>,
    #[serde(default, rename = "fileId", deserialize_with = "lenient::non_empty_string")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub filename: Option<String>,

    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub url: Option<String>,
    #[serde(default, rename = "s3Url", deserialize_with = "lenient::non_empty_string")]
    pub s3_url: Option<String>,
    #[serde(default, rename = "fileUrl", deserialize_with = "lenient::non_empty_string")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub location: Option<String>,

    #[serde(
        default,
        rename = "originalFilename",
        deserialize_with = "lenient::non_empty_string"
    )]
    pub original_filename: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub originalname: Option<String>,
    #[serde(default, rename = "fileName", deserialize_with = "lenient::non_empty_string")]
    pub file_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub mimetype: Option<String>,
    #[serde(default, rename = "mimeType", deserialize_with = "lenient::non_empty_string")]
    pub mime_type: Option<String>,
    #[serde(
        default,
        rename = "contentType",
        deserialize_with = "lenient::non_empty_string"
    )]
    pub content_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::non_zero_u64")]
    pub size: Option<u64>,
    #[serde(default, rename = "fileSize", deserialize_with = "lenient::non_zero_u64")]
    pub file_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::non_zero_u64")]
    pub length: Option<u64>,
}

impl ServerFileRecord {
    /// Reads a record from a JSON object. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Self::deserialize(value).ok()
    }

    /// `id` → `_id` → `fileId` → `filename`.
    pub fn id(&self) -> Option<&str> {
        first([&self.id, &self.underscore_id, &self.file_id, &self.filename])
    }

    /// `url` → `s3Url` → `fileUrl` → `location`.
    pub fn url(&self) -> Option<&str> {
        first([&self.url, &self.s3_url, &self.file_url, &self.location])
    }

    /// `originalFilename` → `originalname` → `fileName` → `filename`.
    pub fn original_filename(&self) -> Option<&str> {
        first([
            &self.original_filename,
            &self.originalname,
            &self.file_name,
            &self.filename,
        ])
    }

    /// `mimetype` → `mimeType` → `contentType`.
    pub fn mimetype(&self) -> Option<&str> {
        first([&self.mimetype, &self.mime_type, &self.content_type])
    }

    /// `size` → `fileSize` → `length`.
    pub fn size(&self) -> Option<u64> {
        self.size.or(self.file_size).or(self.length)
    }
}

fn first<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates.into_iter().find_map(|c| c.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_reads_success_and_message() {
        let env = ServerEnvelope::from_value(&json!({"success": false, "message": "nope"}));
        assert!(env.is_rejected());
        assert_eq!(env.message.as_deref(), Some("nope"));
    }

    #[test]
    fn envelope_tolerates_odd_types() {
        let env = ServerEnvelope::from_value(&json!({"success": "yes", "message": ["x"]}));
        assert_eq!(env.success, None);
        assert_eq!(env.message, None);
        assert!(!env.is_rejected());
    }

    #[test]
    fn envelope_from_non_object_is_empty() {
        let env = ServerEnvelope::from_value(&json!("DB save failed"));
        assert_eq!(env.success, None);
        assert_eq!(env.message, None);
    }

    #[test]
    fn record_resolves_id_precedence() {
        let rec = ServerFileRecord::from_value(&json!({"_id": "b", "fileId": "c"})).unwrap();
        assert_eq!(rec.id(), Some("b"));

        let rec = ServerFileRecord::from_value(&json!({"filename": "f.png"})).unwrap();
        assert_eq!(rec.id(), Some("f.png"));
    }

    #[test]
    fn record_resolves_url_spellings() {
        let rec = ServerFileRecord::from_value(&json!({"location": "l", "fileUrl": "f"})).unwrap();
        assert_eq!(rec.url(), Some("f"));
    }

    #[test]
    fn record_original_filename_falls_back_to_filename() {
        let rec = ServerFileRecord::from_value(&json!({"filename": "stored.png"})).unwrap();
        assert_eq!(rec.original_filename(), Some("stored.png"));
    }

    #[test]
    fn record_size_skips_zero() {
        let rec = ServerFileRecord::from_value(&json!({"size": 0, "fileSize": "99"})).unwrap();
        assert_eq!(rec.size(), Some(99));
    }

    #[test]
    fn record_from_non_object_is_none() {
        assert!(ServerFileRecord::from_value(&json!([1, 2])).is_none());
        assert!(ServerFileRecord::from_value(&json!(null)).is_none());
    }
}
