//! Error hierarchy for the Quill engine.
//!
//! Built on [`thiserror`]:
//!
//! - [`QuillError`]: top-level enum covering the core error domains
//! - [`ModelError`]: language-model collaborator failures with retry info
//! - [`RangeError`]: invalid line-range requests
//! - [`ErrorCategory`]: classification used for retry decisions and the
//!   remediation hints surfaced to the user
//!
//! Taxonomy discipline: transient-network errors are retryable unless the
//! connection was outright refused; client errors are never retried; parse
//! errors are skipped at the extraction site and never reach this level;
//! resolution errors abort one action, not the session; budget overflow is
//! never an error at all (the prompt assembler degrades instead).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// ErrorCategory
// ─────────────────────────────────────────────────────────────────────────────

/// Classification of an error for retry and remediation decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Network failure where the connection was outright refused. Never retried.
    ConnectionRefused,
    /// Other transient network failure (timeout, reset). Retryable.
    Network,
    /// Malformed request rejected by the collaborator. Never retried.
    Client,
    /// Server-side failure at the collaborator. Retryable.
    Server,
    /// Unclassified.
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "connection_refused"),
            Self::Network => write!(f, "network"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl ErrorCategory {
    /// Whether errors in this category should be retried.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }

    /// Remediation hint surfaced to the user alongside the error.
    #[must_use]
    pub fn remediation_hint(self) -> Option<&'static str> {
        match self {
            Self::ConnectionRefused => {
                Some("the model endpoint refused the connection; check that it is running and the endpoint URL is correct")
            }
            Self::Network => Some("network hiccup; the request was retried automatically"),
            Self::Client | Self::Server | Self::Unknown => None,
        }
    }
}

/// Classify a raw error string into an [`ErrorCategory`].
///
/// Matches the substrings the transport layer is known to produce. Anything
/// unrecognized is `Unknown` and therefore not retried.
#[must_use]
pub fn classify_error(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("connection refused") || lower.contains("econnrefused") {
        ErrorCategory::ConnectionRefused
    } else if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection reset")
        || lower.contains("broken pipe")
        || lower.contains("dns")
    {
        ErrorCategory::Network
    } else if lower.contains("400") || lower.contains("invalid request") || lower.contains("bad request") {
        ErrorCategory::Client
    } else if lower.contains("500") || lower.contains("502") || lower.contains("503") || lower.contains("overloaded") {
        ErrorCategory::Server
    } else {
        ErrorCategory::Unknown
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModelError
// ─────────────────────────────────────────────────────────────────────────────

/// Language-model collaborator error.
#[derive(Debug, Error)]
#[error("Model call failed ({category}): {message}")]
pub struct ModelError {
    /// Human-readable message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// HTTP status code if applicable.
    pub status_code: Option<u16>,
    /// Original cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ModelError {
    /// Create a model error, classifying the message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let category = classify_error(&message);
        Self {
            message,
            category,
            status_code: None,
            source: None,
        }
    }

    /// Set an explicit category.
    #[must_use]
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the HTTP status code and infer category from it.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self.category = match status {
            400 => ErrorCategory::Client,
            s if s >= 500 => ErrorCategory::Server,
            _ => self.category,
        };
        self
    }

    /// Set the error cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether this error should be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RangeError
// ─────────────────────────────────────────────────────────────────────────────

/// Invalid line-range request.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid line range {start}..={end} for {path}: {message}")]
pub struct RangeError {
    /// File path the range was requested against.
    pub path: String,
    /// Requested 1-indexed start line.
    pub start: usize,
    /// Requested 1-indexed end line.
    pub end: usize,
    /// Why the range is invalid.
    pub message: String,
}

impl RangeError {
    /// Create a range error.
    #[must_use]
    pub fn new(path: impl Into<String>, start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            start,
            end,
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QuillError
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level error type for the core crates.
#[derive(Debug, Error)]
pub enum QuillError {
    /// Model collaborator failure.
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Invalid line-range request.
    #[error("{0}")]
    Range(#[from] RangeError),

    /// Filesystem failure.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error.
    #[error("[{code}] {message}")]
    Internal {
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

impl QuillError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error with a code and message.
    #[must_use]
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- classify_error --

    #[test]
    fn classify_connection_refused() {
        assert_eq!(
            classify_error("connect error: Connection refused (os error 111)"),
            ErrorCategory::ConnectionRefused
        );
        assert_eq!(classify_error("ECONNREFUSED"), ErrorCategory::ConnectionRefused);
    }

    #[test]
    fn classify_timeout_as_network() {
        assert_eq!(classify_error("request timed out"), ErrorCategory::Network);
        assert_eq!(classify_error("connection reset by peer"), ErrorCategory::Network);
    }

    #[test]
    fn classify_bad_request_as_client() {
        assert_eq!(classify_error("400 bad request"), ErrorCategory::Client);
        assert_eq!(classify_error("invalid request: missing field"), ErrorCategory::Client);
    }

    #[test]
    fn classify_server_errors() {
        assert_eq!(classify_error("503 service unavailable"), ErrorCategory::Server);
        assert_eq!(classify_error("model overloaded"), ErrorCategory::Server);
    }

    #[test]
    fn classify_unknown() {
        assert_eq!(classify_error("something odd"), ErrorCategory::Unknown);
    }

    // -- retryability --

    #[test]
    fn refused_is_not_retryable() {
        assert!(!ErrorCategory::ConnectionRefused.is_retryable());
    }

    #[test]
    fn network_and_server_are_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
    }

    #[test]
    fn client_is_not_retryable() {
        assert!(!ErrorCategory::Client.is_retryable());
    }

    #[test]
    fn refused_has_remediation_hint() {
        let hint = ErrorCategory::ConnectionRefused.remediation_hint();
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("refused"));
    }

    // -- ModelError --

    #[test]
    fn model_error_classifies_message() {
        let err = ModelError::new("request timed out after 30s");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn model_error_with_status_overrides() {
        let err = ModelError::new("boom").with_status(500);
        assert_eq!(err.category, ErrorCategory::Server);
        assert_eq!(err.status_code, Some(500));
    }

    #[test]
    fn model_error_refused_not_retryable() {
        let err = ModelError::new("connection refused");
        assert!(!err.is_retryable());
    }

    #[test]
    fn model_error_display() {
        let err = ModelError::new("400 bad request");
        let text = err.to_string();
        assert!(text.contains("client"));
        assert!(text.contains("400 bad request"));
    }

    // -- RangeError --

    #[test]
    fn range_error_display() {
        let err = RangeError::new("src/main.rs", 5, 3, "start is after end");
        let text = err.to_string();
        assert!(text.contains("src/main.rs"));
        assert!(text.contains("5..=3"));
        assert!(text.contains("start is after end"));
    }

    // -- QuillError --

    #[test]
    fn quill_error_from_model() {
        let err = QuillError::from(ModelError::new("timeout"));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn quill_error_from_range() {
        let err = QuillError::from(RangeError::new("f.rs", 2, 1, "bad"));
        assert!(err.to_string().contains("f.rs"));
    }

    #[test]
    fn quill_error_io_carries_path() {
        let err = QuillError::io("missing.txt", std::io::Error::other("gone"));
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn quill_error_internal_format() {
        let err = QuillError::internal("BAD_STATE", "oops");
        assert_eq!(err.to_string(), "[BAD_STATE] oops");
    }

    #[test]
    fn errors_are_std_error() {
        let _: &dyn std::error::Error = &ModelError::new("x");
        let _: &dyn std::error::Error = &RangeError::new("p", 1, 2, "m");
        let _: &dyn std::error::Error = &QuillError::internal("C", "m");
    }
}
