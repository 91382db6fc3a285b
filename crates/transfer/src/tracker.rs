use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::TransferError;

/// Cancelable token for one in-flight transfer.
///
/// The key is the originating filename (or a caller-supplied id); the
/// `id` is unique per registration.
#[derive(Debug, Clone)]
pub struct TransferHandle {
    key: String,
    id: Uuid,
    token: CancellationToken,
}

impl TransferHandle {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Token to pass to the transport; cancelled when the handle is.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of cancelling a single transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    pub ok: bool,
    pub message: String,
}

/// Result of cancelling every transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAllOutcome {
    pub count: usize,
    pub message: String,
}

/// Registry of in-flight transfers.
///
/// At most one handle is active per key. Implementations must tolerate
/// concurrent calls from independent transfers.
pub trait TransferRegistry: Send + Sync {
    /// Registers a new transfer. Fails if `key` already has an active handle.
    fn register(&self, key: &str) -> Result<TransferHandle, TransferError>;

    /// Removes `handle` if it is still the active one for its key.
    fn deregister(&self, handle: &TransferHandle) -> bool;

    /// Cancels and removes the transfer registered under `key`.
    fn cancel(&self, key: &str) -> CancelOutcome;

    /// Cancels and removes every registered transfer.
    fn cancel_all(&self) -> CancelAllOutcome;

    /// Returns `true` if `key` has an active handle.
    fn is_active(&self, key: &str) -> bool;
}

/// Mutex-guarded [`TransferRegistry`].
#[derive(Debug, Default)]
pub struct TransferTracker {
    active: Mutex<HashMap<String, TransferHandle>>,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active transfers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TransferHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransferRegistry for TransferTracker {
    fn register(&self, key: &str) -> Result<TransferHandle, TransferError> {
        let mut active = self.lock();
        if active.contains_key(key) {
            return Err(TransferError::AlreadyActive(key.to_string()));
        }
        let handle = TransferHandle::new(key);
        active.insert(key.to_string(), handle.clone());
        debug!(key, id = %handle.id, "transfer registered");
        Ok(handle)
    }

    fn deregister(&self, handle: &TransferHandle) -> bool {
        let mut active = self.lock();
        match active.get(&handle.key) {
            Some(current) if current.id == handle.id => {
                active.remove(&handle.key);
                debug!(key = %handle.key, id = %handle.id, "transfer deregistered");
                true
            }
            _ => false,
        }
    }

    fn cancel(&self, key: &str) -> CancelOutcome {
        let removed = self.lock().remove(key);
        match removed {
            Some(handle) => {
                handle.token.cancel();
                info!(key, id = %handle.id, "upload canceled");
                CancelOutcome {
                    ok: true,
                    message: "Upload canceled.".into(),
                }
            }
            None => CancelOutcome {
                ok: false,
                message: "No upload found to cancel.".into(),
            },
        }
    }

    fn cancel_all(&self) -> CancelAllOutcome {
        let drained: Vec<TransferHandle> = self.lock().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.token.cancel();
        }
        let count = drained.len();
        info!(count, "all uploads canceled");
        CancelAllOutcome {
            count,
            message: format!("{count} uploads canceled."),
        }
    }

    fn is_active(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}
