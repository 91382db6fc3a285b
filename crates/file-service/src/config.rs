//! Service configuration.
//!
//! Read from an optional JSON file, then overridden by environment:
//! - `FILEGATE_API_URL`: metadata server base URL
//! - `FILEGATE_OBJECT_URL`: object store base URL

use std::path::Path;
use std::time::Duration;

use filegate_transfer::{FileTypeRule, GLOBAL_UPLOAD_LIMIT, TypeRegistry};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_API_URL: &str = "FILEGATE_API_URL";
const ENV_OBJECT_URL: &str = "FILEGATE_OBJECT_URL";

/// One accepted file category, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeConfig {
    pub category: String,
    pub display_name: String,
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    pub max_size_bytes: u64,
}

impl From<&FileTypeRule> for FileTypeConfig {
    fn from(rule: &FileTypeRule) -> Self {
        Self {
            category: rule.category().to_string(),
            display_name: rule.display_name().to_string(),
            extensions: rule.extensions().to_vec(),
            mime_types: rule.mime_types().to_vec(),
            max_size_bytes: rule.max_size_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Metadata server base URL.
    pub api_base_url: String,
    /// Object store base URL; object keys are appended to it.
    pub object_base_url: String,
    pub upload_limit_bytes: u64,
    pub download_timeout_secs: u64,
    /// Delay before a staged download is released.
    pub release_delay_ms: u64,
    pub file_types: Vec<FileTypeConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".into(),
            object_base_url: "http://localhost:9000/files".into(),
            upload_limit_bytes: GLOBAL_UPLOAD_LIMIT,
            download_timeout_secs: 30,
            release_delay_ms: 100,
            file_types: TypeRegistry::default()
                .rules()
                .iter()
                .map(FileTypeConfig::from)
                .collect(),
        }
    }
}

impl ServiceConfig {
    /// Loads `path` if given and present, then applies env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                let config: Self = serde_json::from_str(&content)?;
                tracing::debug!(path = %p.display(), "loaded config file");
                config
            }
            Some(p) => {
                tracing::warn!(path = %p.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = non_empty(ENV_OBJECT_URL) {
            self.object_base_url = url;
        }
    }

    /// Builds the validation rules. Fails if a rule is malformed or a
    /// category limit exceeds the upload limit.
    pub fn type_registry(&self) -> Result<TypeRegistry, ConfigError> {
        let rules = self
            .file_types
            .iter()
            .map(|t| {
                FileTypeRule::new(
                    &t.category,
                    &t.display_name,
                    &t.extensions,
                    &t.mime_types,
                    t.max_size_bytes,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeRegistry::new(rules, self.upload_limit_bytes)?)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.api_base_url, &self.object_base_url)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

/// URL construction for both servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_base: String,
    object_base: String,
}

impl Endpoints {
    pub fn new(api_base: &str, object_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            object_base: object_base.trim_end_matches('/').to_string(),
        }
    }

    /// `upload/{logical_name}/{filename}`
    pub fn object_key(logical_name: &str, filename: &str) -> String {
        format!("upload/{logical_name}/{filename}")
    }

    pub fn object_url(&self, object_key: &str) -> String {
        format!("{}/{object_key}", self.object_base)
    }

    pub fn metadata_url(&self) -> String {
        format!("{}/api/files/upload", self.api_base)
    }

    pub fn file_info_url(&self, file_id: &str) -> String {
        format!("{}/api/files/{file_id}", self.api_base)
    }

    /// `{object_base}/download/{filename}`, or `/view/` when
    /// `for_preview` is set. Empty for an empty filename.
    pub fn file_url(&self, filename: &str, for_preview: bool) -> String {
        if filename.is_empty() {
            return String::new();
        }
        let route = if for_preview { "view" } else { "download" };
        format!("{}/{route}/{filename}", self.object_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_a_valid_registry() {
        let config = ServiceConfig::default();
        let registry = config.type_registry().unwrap();
        assert_eq!(registry.upload_limit(), GLOBAL_UPLOAD_LIMIT);
        assert_eq!(registry.rules().len(), 2);
        assert_eq!(config.download_timeout(), Duration::from_secs(30));
        assert_eq!(config.release_delay(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "https://api.example.com"}"#).unwrap();

        let config = ServiceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.download_timeout_secs, 30);
        assert_eq!(config.file_types.len(), 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ServiceConfig::load(Some(&path)),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn env_overrides_urls() {
        let mut config = ServiceConfig::default();
        config.apply_env(|key| match key {
            "FILEGATE_API_URL" => Some("https://api.internal".into()),
            "FILEGATE_OBJECT_URL" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://api.internal");
        assert_eq!(config.object_base_url, ServiceConfig::default().object_base_url);
    }

    #[test]
    fn category_limit_above_ceiling_is_rejected() {
        let mut config = ServiceConfig::default();
        config.file_types[0].max_size_bytes = config.upload_limit_bytes + 1;
        assert!(matches!(config.type_registry(), Err(ConfigError::Rule(_))));
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let mut config = ServiceConfig::default();
        config.file_types[1].extensions.clear();
        assert!(config.type_registry().is_err());
    }

    #[test]
    fn endpoint_urls() {
        let ep = Endpoints::new("https://api/", "https://store/bucket/");
        let key = Endpoints::object_key("avatar", "me.png");
        assert_eq!(key, "upload/avatar/me.png");
        assert_eq!(ep.object_url(&key), "https://store/bucket/upload/avatar/me.png");
        assert_eq!(ep.metadata_url(), "https://api/api/files/upload");
        assert_eq!(ep.file_info_url("42"), "https://api/api/files/42");
        assert_eq!(ep.file_url("a.pdf", false), "https://store/bucket/download/a.pdf");
        assert_eq!(ep.file_url("a.pdf", true), "https://store/bucket/view/a.pdf");
        assert_eq!(ep.file_url("", true), "");
    }
}
