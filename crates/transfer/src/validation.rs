use std::sync::Arc;

use filegate_notify::Notifier;
use tracing::debug;

use crate::size::{file_extension, format_file_size};
use crate::types::{FileInfo, TypeRegistry};
use crate::{ErrorKind, SizeScope};

/// Result of validating a candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected { kind: ErrorKind, message: String },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Human-readable rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted => None,
            Self::Rejected { message, .. } => Some(message),
        }
    }

    fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }
}

/// Checks files against a [`TypeRegistry`] and reports rejections.
///
/// Rules are evaluated in order and stop at the first failure:
/// presence, global ceiling, MIME type, category limit, extension.
#[derive(Clone)]
pub struct Validator {
    registry: Arc<TypeRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl Validator {
    pub fn new(registry: Arc<TypeRegistry>, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, notifier }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Validates `file` and pushes an error notification on rejection.
    pub fn validate(&self, file: Option<&FileInfo>) -> ValidationOutcome {
        let outcome = self.evaluate(file);
        if let ValidationOutcome::Rejected { kind, message } = &outcome {
            debug!(?kind, %message, "file rejected");
            self.notifier.error(message);
        }
        outcome
    }

    /// Validates `file` without side effects.
    pub fn evaluate(&self, file: Option<&FileInfo>) -> ValidationOutcome {
        let Some(file) = file else {
            return ValidationOutcome::rejected(ErrorKind::NoFile, "No file selected.");
        };

        let limit = self.registry.upload_limit();
        if file.size > limit {
            return ValidationOutcome::rejected(
                ErrorKind::SizeExceeded(SizeScope::Global),
                format!("File size cannot exceed {}.", format_file_size(limit)),
            );
        }

        let Some(rule) = self.registry.rule_for_mime(&file.mime_type) else {
            return ValidationOutcome::rejected(ErrorKind::UnsupportedType, "Unsupported file type.");
        };

        if file.size > rule.max_size_bytes() {
            return ValidationOutcome::rejected(
                ErrorKind::SizeExceeded(SizeScope::Category),
                format!(
                    "{} files cannot exceed {}.",
                    rule.display_name(),
                    format_file_size(rule.max_size_bytes())
                ),
            );
        }

        if !rule.allows_extension(&file_extension(&file.name)) {
            return ValidationOutcome::rejected(
                ErrorKind::InvalidExtension,
                "Invalid file extension.",
            );
        }

        ValidationOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_notify::{NoopNotifier, ToastKind, ToastNotifier};

    const MIB: u64 = 1024 * 1024;

    fn validator() -> Validator {
        Validator::new(Arc::new(TypeRegistry::default()), Arc::new(NoopNotifier))
    }

    fn kind_of(outcome: &ValidationOutcome) -> Option<ErrorKind> {
        match outcome {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected { kind, .. } => Some(*kind),
        }
    }

    #[test]
    fn missing_file_is_rejected() {
        let outcome = validator().validate(None);
        assert_eq!(kind_of(&outcome), Some(ErrorKind::NoFile));
        assert_eq!(outcome.reason(), Some("No file selected."));
    }

    #[test]
    fn oversize_files_hit_global_limit_regardless_of_type() {
        for mime in ["image/png", "application/pdf", "text/plain", ""] {
            let file = FileInfo::new("big.png", 50 * MIB + 1, mime);
            let outcome = validator().validate(Some(&file));
            assert_eq!(
                kind_of(&outcome),
                Some(ErrorKind::SizeExceeded(SizeScope::Global)),
                "mime {mime}"
            );
            assert_eq!(outcome.reason(), Some("File size cannot exceed 50 MB."));
        }
    }

    #[test]
    fn exactly_at_global_limit_passes_global_check() {
        let file = FileInfo::new("big.pdf", 50 * MIB, "application/pdf");
        let outcome = validator().validate(Some(&file));
        assert_eq!(
            kind_of(&outcome),
            Some(ErrorKind::SizeExceeded(SizeScope::Category))
        );
    }

    #[test]
    fn unregistered_mime_is_unsupported_even_when_small() {
        let file = FileInfo::new("notes.txt", 10, "text/plain");
        let outcome = validator().validate(Some(&file));
        assert_eq!(kind_of(&outcome), Some(ErrorKind::UnsupportedType));
    }

    #[test]
    fn category_limit_uses_display_name() {
        let file = FileInfo::new("huge.png", 11 * MIB, "image/png");
        let outcome = validator().validate(Some(&file));
        assert_eq!(outcome.reason(), Some("Image files cannot exceed 10 MB."));
    }

    #[test]
    fn mismatched_extension_is_rejected() {
        let file = FileInfo::new("photo.txt", 100, "image/png");
        let outcome = validator().validate(Some(&file));
        assert_eq!(kind_of(&outcome), Some(ErrorKind::InvalidExtension));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let file = FileInfo::new("photo", 100, "image/png");
        let outcome = validator().validate(Some(&file));
        assert_eq!(kind_of(&outcome), Some(ErrorKind::InvalidExtension));
    }

    #[test]
    fn upper_case_extension_is_accepted() {
        let file = FileInfo::new("PHOTO.PNG", 100, "image/png");
        assert!(validator().validate(Some(&file)).is_accepted());
    }

    #[test]
    fn rejection_notifies_once_and_acceptance_is_silent() {
        let toasts = Arc::new(ToastNotifier::new());
        let v = Validator::new(Arc::new(TypeRegistry::default()), toasts.clone());

        v.validate(Some(&FileInfo::new("a.png", 10, "image/png")));
        assert!(toasts.snapshot().is_empty());

        v.validate(Some(&FileInfo::new("a.exe", 10, "application/x-msdownload")));
        let pushed = toasts.drain();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].kind, ToastKind::Error);
        assert_eq!(pushed[0].message, "Unsupported file type.");
    }

    #[test]
    fn evaluate_has_no_side_effects() {
        let toasts = Arc::new(ToastNotifier::new());
        let v = Validator::new(Arc::new(TypeRegistry::default()), toasts.clone());
        assert!(!v.evaluate(None).is_accepted());
        assert!(toasts.snapshot().is_empty());
    }
}
