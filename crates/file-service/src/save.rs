//! Save targets for downloaded content.
//!
//! A download is first staged as a temporary resource, then saved under
//! its final name. The staged resource is released by the caller after a
//! short delay, once the save has had time to complete.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SaveError;

/// Handle to staged content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResource {
    pub id: Uuid,
    pub content_type: String,
    pub size: u64,
}

/// Destination for downloaded files.
pub trait SaveSink: Send + Sync {
    /// Holds `data` in a temporary resource.
    fn stage(&self, data: Bytes, content_type: &str) -> Result<StagedResource, SaveError>;

    /// Saves a staged resource under `filename`, returning where it went.
    fn trigger_save(&self, staged: &StagedResource, filename: &str) -> Result<PathBuf, SaveError>;

    /// Frees the temporary resource. Unknown handles are ignored.
    fn release(&self, staged: StagedResource);
}

/// Saves downloads into a directory.
///
/// Staged content lives in temp files inside the target directory and is
/// deleted on release.
pub struct DirectorySaveSink {
    dir: PathBuf,
    staged: Mutex<HashMap<Uuid, NamedTempFile>>,
}

impl DirectorySaveSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of staged resources not yet released.
    pub fn staged_count(&self) -> usize {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SaveSink for DirectorySaveSink {
    fn stage(&self, data: Bytes, content_type: &str) -> Result<StagedResource, SaveError> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(&data)?;
        file.flush()?;

        let staged = StagedResource {
            id: Uuid::new_v4(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
        };
        debug!(id = %staged.id, path = %file.path().display(), "staged download");
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(staged.id, file);
        Ok(staged)
    }

    fn trigger_save(&self, staged: &StagedResource, filename: &str) -> Result<PathBuf, SaveError> {
        let staged_map = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        let temp = staged_map
            .get(&staged.id)
            .ok_or(SaveError::UnknownResource(staged.id))?;

        let dest = self.dir.join(safe_file_name(filename));
        std::fs::copy(temp.path(), &dest)?;
        debug!(id = %staged.id, dest = %dest.display(), "saved download");
        Ok(dest)
    }

    fn release(&self, staged: StagedResource) {
        let removed = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&staged.id);
        match removed {
            Some(file) => {
                if let Err(e) = file.close() {
                    warn!(id = %staged.id, error = %e, "failed to remove staged file");
                }
            }
            None => debug!(id = %staged.id, "release of unknown staged resource"),
        }
    }
}

/// Strips directory components so a server-supplied name cannot escape
/// the target directory.
fn safe_file_name(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => "download".to_string(),
        name => name.to_string(),
    }
}
