//! User-facing notifications for file transfer outcomes.
//!
//! The transfer core only needs a fire-and-forget sink with two levels.
//! Presentation (timers, styling) belongs to whoever drains the queue.

mod toast;

pub use toast::{Toast, ToastKind, ToastNotifier, ToastQueue};

/// Fire-and-forget sink for user-visible messages.
pub trait Notifier: Send + Sync {
    /// Reports a successful operation.
    fn success(&self, message: &str);

    /// Reports a failed operation.
    fn error(&self, message: &str);
}

/// Discards every notification. Useful when callers render messages
/// themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn success(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Forwards notifications to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!(%message, "notification");
    }

    fn error(&self, message: &str) {
        tracing::warn!(%message, "notification");
    }
}
