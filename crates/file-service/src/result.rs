//! Outcome types returned by the orchestrators.

use std::fmt;
use std::path::PathBuf;

use filegate_protocol::FileDescriptor;
use filegate_transfer::ErrorKind;

use crate::classify::{Classified, FailureSignal, Phase, classify};
use crate::http::{HttpResponse, TransportError};

/// A classified, user-presentable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Description of the underlying error, for logs.
    pub cause: Option<String>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Classifies a request that got no response.
    pub(crate) fn from_transport(error: TransportError, phase: Phase) -> Self {
        let classified = classify(&FailureSignal::NoResponse(error.clone()), phase);
        Self::from(classified).with_cause(error)
    }

    /// Classifies an error-status response, preferring its `message` field.
    pub(crate) fn from_status(response: &HttpResponse, phase: Phase) -> Self {
        let signal = FailureSignal::Status {
            status: response.status,
            server_message: response.server_message(),
        };
        Self::from(classify(&signal, phase)).with_cause(format!("server returned {}", response.status))
    }
}

impl From<Classified> for Failure {
    fn from(c: Classified) -> Self {
        Self {
            kind: c.kind,
            message: c.message,
            retryable: c.retryable,
            cause: None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of an upload or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult<T> {
    Success(T),
    Failure(Failure),
}

impl<T> TransferResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(f) => Some(f),
            Self::Success(_) => None,
        }
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(f) => Err(f),
        }
    }
}

impl<T> From<Failure> for TransferResult<T> {
    fn from(f: Failure) -> Self {
        Self::Failure(f)
    }
}

/// A completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file: FileDescriptor,
    /// Key the bytes were stored under: `upload/{logical_name}/{filename}`.
    pub object_key: String,
    pub object_url: String,
}

/// Anything a preview URL can be derived from.
pub trait PreviewSource {
    /// URL recorded by the metadata server.
    fn recorded_url(&self) -> Option<&str>;

    /// Object-store URL the bytes were written to, when known.
    fn object_url(&self) -> Option<&str> {
        None
    }

    /// Stored file name.
    fn stored_filename(&self) -> Option<&str>;
}

impl PreviewSource for FileDescriptor {
    fn recorded_url(&self) -> Option<&str> {
        Some(self.url.as_str())
    }

    fn stored_filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}

impl PreviewSource for UploadedFile {
    fn recorded_url(&self) -> Option<&str> {
        self.file.recorded_url()
    }

    fn object_url(&self) -> Option<&str> {
        Some(self.object_url.as_str())
    }

    fn stored_filename(&self) -> Option<&str> {
        self.file.stored_filename()
    }
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Where the save sink put the file.
    pub saved_to: PathBuf,
}
