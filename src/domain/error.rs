//! Domain-level error types for shortlink-client.
//!
//! All errors are typed with `thiserror`. Local failures (validation, missing
//! session) never involve the network; remote failures keep the server's
//! message when it sent one.

use serde::Serialize;
use thiserror::Error;

/// Message shown when an operation needs a session and none is present.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to continue";

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Local input check failed before any request was made.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// The operation requires a session and none is present.
    #[error("Please log in to continue")]
    Unauthenticated,

    /// The remote service could not be reached or answered unreadably.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The remote service answered with a non-success status.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failed to open or query the session database.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Writing to the clipboard failed.
    #[error("Clipboard error: {message}")]
    Clipboard { message: String },
}

impl AppError {
    /// Create a validation error for the named input field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a transport error from a reqwest error.
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a storage error from rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Coarse classification used by operation state.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Server { .. } => ErrorKind::Server,
            Self::Config { .. }
            | Self::Storage { .. }
            | Self::JsonParse { .. }
            | Self::Io { .. }
            | Self::Clipboard { .. } => ErrorKind::Local,
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error classes surfaced to rendering surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Transport,
    Server,
    Local,
}

/// Cloneable failure payload held by `OperationState::Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// Human-readable message, safe to render inline.
    pub message: String,
}

impl ErrorInfo {
    /// Build the user-facing failure for an error.
    ///
    /// Server and validation messages are kept verbatim and local failures
    /// describe themselves; remote failures without a usable message fall
    /// back to `fallback`.
    #[must_use]
    pub fn from_error(err: &AppError, fallback: &str) -> Self {
        let message = match err {
            AppError::Validation { message, .. } => message.clone(),
            AppError::Unauthenticated => LOGIN_REQUIRED_MESSAGE.to_string(),
            AppError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ if err.kind() == ErrorKind::Local => err.to_string(),
            _ => fallback.to_string(),
        };

        Self {
            kind: err.kind(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_is_verbatim() {
        let err = AppError::Server {
            status: 409,
            message: Some("Slug already in use".into()),
        };
        let info = ErrorInfo::from_error(&err, "Failed to update link");
        assert_eq!(info.kind, ErrorKind::Server);
        assert_eq!(info.message, "Slug already in use");
    }

    #[test]
    fn test_missing_server_message_falls_back() {
        let err = AppError::Server {
            status: 500,
            message: None,
        };
        let info = ErrorInfo::from_error(&err, "Something went wrong");
        assert_eq!(info.message, "Something went wrong");

        let blank = AppError::Server {
            status: 502,
            message: Some("  ".into()),
        };
        assert_eq!(
            ErrorInfo::from_error(&blank, "Something went wrong").message,
            "Something went wrong"
        );
    }

    #[test]
    fn test_local_errors_keep_their_message() {
        let err = AppError::validation("url", "Please enter a valid URL");
        let info = ErrorInfo::from_error(&err, "unused");
        assert_eq!(info.kind, ErrorKind::Validation);
        assert_eq!(info.message, "Please enter a valid URL");

        let info = ErrorInfo::from_error(&AppError::Unauthenticated, "unused");
        assert_eq!(info.kind, ErrorKind::Unauthenticated);
        assert_eq!(info.message, LOGIN_REQUIRED_MESSAGE);

        let err = AppError::Config {
            message: "bad base url".into(),
        };
        let info = ErrorInfo::from_error(&err, "Invalid email or password");
        assert_eq!(info.kind, ErrorKind::Local);
        assert_eq!(info.message, "Configuration error: bad base url");
    }
}
