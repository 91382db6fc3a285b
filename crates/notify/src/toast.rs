use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Notifier;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A queued user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// In-memory toast queue with monotonic ID assignment.
///
/// Display and dismissal are left to the presenting layer.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a toast and returns its ID.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Removes and returns every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Thread-safe [`Notifier`] that records into a [`ToastQueue`].
#[derive(Debug, Default)]
pub struct ToastNotifier {
    queue: Mutex<ToastQueue>,
}

impl ToastNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending toast.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().drain()
    }

    /// Copies the pending toasts without removing them.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, ToastQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastNotifier {
    fn success(&self, message: &str) {
        self.lock().push(ToastKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.lock().push(ToastKind::Error, message);
    }
}
