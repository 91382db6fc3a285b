//! Maps transport and server failures to a kind, a message and a
//! retryability flag.

use filegate_transfer::ErrorKind;

use crate::http::TransportError;

/// Statuses worth retrying.
const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Which operation failed. Selects the default and timeout messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Download,
}

impl Phase {
    fn default_message(self) -> &'static str {
        match self {
            Self::Upload => "File upload failed.",
            Self::Download => "File download failed.",
        }
    }

    fn timeout_message(self) -> &'static str {
        match self {
            Self::Upload => "File upload timed out.",
            Self::Download => "File download timed out.",
        }
    }

    pub(crate) fn canceled_message(self) -> &'static str {
        match self {
            Self::Upload => "Upload canceled.",
            Self::Download => "Download canceled.",
        }
    }
}

/// What went wrong, as observed by an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// No response was received.
    NoResponse(TransportError),
    /// A response arrived with a non-success status.
    Status {
        status: u16,
        server_message: Option<String>,
    },
    /// A 2xx response whose body reported `success: false`.
    Rejected { server_message: Option<String> },
    /// Anything else, described by its own text.
    Other(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

/// Classifies a failure signal for the given phase.
pub fn classify(signal: &FailureSignal, phase: Phase) -> Classified {
    let retryable = is_retryable(signal);
    let (kind, message) = match signal {
        FailureSignal::NoResponse(TransportError::Canceled) => {
            (ErrorKind::Canceled, phase.canceled_message().to_string())
        }
        FailureSignal::NoResponse(TransportError::TimedOut) => {
            (ErrorKind::Timeout, phase.timeout_message().to_string())
        }
        FailureSignal::NoResponse(TransportError::Network(_)) => (
            ErrorKind::NetworkError,
            "Network error. Check your connection and try again.".to_string(),
        ),
        FailureSignal::Status {
            status,
            server_message,
        } => classify_status(*status, server_message.as_deref(), phase),
        FailureSignal::Rejected { server_message } => {
            let fallback = match phase {
                Phase::Upload => "Failed to save file info.",
                Phase::Download => phase.default_message(),
            };
            (
                ErrorKind::Unknown,
                server_message.as_deref().unwrap_or(fallback).to_string(),
            )
        }
        FailureSignal::Other(description) => (
            ErrorKind::Unknown,
            description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(status_message(0))
                .to_string(),
        ),
    };
    Classified {
        kind,
        message,
        retryable,
    }
}

fn classify_status(status: u16, server: Option<&str>, phase: Phase) -> (ErrorKind, String) {
    let server_or = |fallback: &str| server.unwrap_or(fallback).to_string();
    match status {
        400 => (ErrorKind::BadRequest, server_or(status_message(400))),
        401 => (ErrorKind::AuthExpired, status_message(401).to_string()),
        403 => (ErrorKind::Forbidden, status_message(403).to_string()),
        404 => (ErrorKind::NotFound, status_message(404).to_string()),
        408 => (ErrorKind::Timeout, server_or(phase.timeout_message())),
        413 => (ErrorKind::TooLarge, status_message(413).to_string()),
        415 => (ErrorKind::UnsupportedMedia, status_message(415).to_string()),
        500 => (ErrorKind::ServerError, status_message(500).to_string()),
        503 => (ErrorKind::ServerError, server_or(status_message(503))),
        501..=599 => (ErrorKind::ServerError, server_or(phase.default_message())),
        _ => (ErrorKind::Unknown, server_or(phase.default_message())),
    }
}

/// `true` when nothing came back (other than a user cancel) or the status
/// is one of 408, 429, 500, 502, 503, 504.
pub fn is_retryable(signal: &FailureSignal) -> bool {
    match signal {
        FailureSignal::NoResponse(TransportError::Canceled) => false,
        FailureSignal::NoResponse(_) => true,
        FailureSignal::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
        FailureSignal::Rejected { .. } | FailureSignal::Other(_) => false,
    }
}

/// Generic user-facing text for an HTTP status.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request.",
        401 => "Authentication required.",
        403 => "You do not have permission to access this file.",
        404 => "File not found.",
        413 => "File is too large.",
        415 => "Unsupported file type.",
        500 => "A server error occurred.",
        503 => "Service temporarily unavailable.",
        _ => "An unknown error occurred.",
    }
}
