//! Error types for the file service.

/// The session is no longer valid; the caller must log in again.
///
/// This is the only condition the orchestrators raise instead of
/// returning as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Authentication expired. Please log in again.")]
pub struct AuthExpired;

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid file type rule: {0}")]
    Rule(#[from] filegate_transfer::TransferError),
}

/// Errors produced by a save sink.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown staged resource: {0}")]
    UnknownResource(uuid::Uuid),

    #[error("save task failed: {0}")]
    Join(String),
}
