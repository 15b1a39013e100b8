//! Error classification.
//!
//! Every failure the board can run into is turned into a [`ClassifiedError`]
//! where it is first observed. Callers branch on [`ErrorKind`] and never look
//! at message text.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::api::ApiError;

/// Fallback message when a raw failure has nothing useful to say.
const GENERIC_MESSAGE: &str = "An unexpected error occurred.";

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Could not reach the backend at all.
    Network,
    /// The request did not finish within the request timeout.
    Timeout,
    /// Backend answered with a 4xx status.
    UpstreamClient,
    /// Backend answered with a 5xx status.
    UpstreamServer,
    /// Bad caller input or a response with the wrong shape.
    Validation,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UpstreamClient => "upstream_client",
            ErrorKind::UpstreamServer => "upstream_server",
            ErrorKind::Validation => "validation",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure tagged with its kind.
///
/// Cheap to clone so the latest one can sit in shared board state.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    timestamp: DateTime<Utc>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            source: None,
        }
    }

    /// Bad input or a malformed response.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Attach the underlying failure.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Text suitable for showing on the board.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "Request is taking too long. Please try again.".into(),
            ErrorKind::UpstreamClient | ErrorKind::UpstreamServer => {
                "Service temporarily unavailable. Please try again in a moment.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Unknown => {
                "Something went wrong. Please refresh the page and try again.".into()
            }
        }
    }

    /// Log this error once with the call site that observed it.
    pub fn log(&self, context: &str) {
        error!(
            kind = %self.kind,
            context,
            timestamp = %self.timestamp.to_rfc3339(),
            source = ?self.source.as_ref().map(|s| s.to_string()),
            "{}",
            self.message
        );
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<ApiError> for ClassifiedError {
    fn from(err: ApiError) -> Self {
        let (kind, message) = match &err {
            ApiError::Timeout { .. } => (
                ErrorKind::Timeout,
                "Request timed out. Please try again.".to_string(),
            ),
            ApiError::Network { .. } => (
                ErrorKind::Network,
                "Network error. Please check your connection.".to_string(),
            ),
            ApiError::Status { status, .. } if (400..500).contains(status) => (
                ErrorKind::UpstreamClient,
                "Invalid request. Please try again.".to_string(),
            ),
            ApiError::Status { status, .. } if *status >= 500 => (
                ErrorKind::UpstreamServer,
                "Server error. Please try again later.".to_string(),
            ),
            ApiError::InvalidResponse(message) => (ErrorKind::Validation, message.clone()),
            other => {
                let raw = other.to_string();
                let message = if raw.trim().is_empty() {
                    GENERIC_MESSAGE.to_string()
                } else {
                    raw
                };
                (ErrorKind::Unknown, message)
            }
        };

        ClassifiedError::new(kind, message).with_source(err)
    }
}

/// Classify a raw failure. Already-classified errors pass through untouched.
pub fn classify(err: impl Into<ClassifiedError>) -> ClassifiedError {
    err.into()
}
