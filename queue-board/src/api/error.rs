//! Backend transport errors.
//!
//! Each variant is produced at the point the failure is detected, so
//! classification never has to guess from message text.

/// Errors from the backend HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout.
    #[error("Request timeout for {endpoint}")]
    Timeout { endpoint: String },

    /// Connection refused, DNS failure, reset mid-request, etc.
    #[error("network error for {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered outside 2xx.
    ///
    /// `body` is the parsed error body, or `{"message": "HTTP <status>: <reason>"}`
    /// when the body was not JSON.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    /// A 2xx body that is not valid JSON.
    #[error("invalid JSON from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Valid JSON with the wrong shape.
    #[error("{0}")]
    InvalidResponse(String),

    /// Anything the transport reported that fits nowhere else.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    /// Sort a reqwest failure into the matching variant.
    pub(crate) fn from_transport(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ApiError::Network {
                endpoint: endpoint.to_string(),
                source: err,
            }
        } else {
            ApiError::Unexpected(err.to_string())
        }
    }

    /// HTTP status, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
