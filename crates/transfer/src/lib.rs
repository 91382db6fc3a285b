//! File validation rules and in-flight transfer tracking.
//!
//! Everything here runs without network access: the validator gates
//! uploads before any request is made, and the tracker owns the
//! cancellation handles of transfers that are in flight.

mod kind;
mod size;
mod tracker;
mod types;
mod validation;

pub use kind::{ErrorKind, SizeScope};
pub use size::{file_extension, format_file_size};
pub use tracker::{
    CancelAllOutcome, CancelOutcome, TransferHandle, TransferRegistry, TransferTracker,
};
pub use types::{FileInfo, FileTypeRule, LocalFile, TypeRegistry};
pub use validation::{ValidationOutcome, Validator};

/// Global upload ceiling: 50 MiB.
pub const GLOBAL_UPLOAD_LIMIT: u64 = 50 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file type rule: {0}")]
    InvalidRule(String),

    #[error("transfer already active for key: {0}")]
    AlreadyActive(String),
}
