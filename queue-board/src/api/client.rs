//! Queue backend HTTP client.
//!
//! Thin wrapper over `reqwest`: one JSON request per call, a fixed timeout,
//! and transport failures sorted into [`ApiError`] variants as they happen.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL, e.g. `https://queue.example.com`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Create a new config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET` an endpoint and parse the JSON body.
    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint).await
    }

    /// `DELETE` an endpoint and parse the JSON body, if any.
    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint).await
    }

    /// Perform one request.
    ///
    /// `endpoint` is the path plus query string, appended to the base URL.
    /// Non-2xx responses become [`ApiError::Status`] carrying the parsed error
    /// body. An empty 2xx body parses as `null`.
    pub async fn request(&self, method: Method, endpoint: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%method, endpoint, "API request");

        let result = self.send(method, &url, endpoint).await;
        match &result {
            Ok(_) => debug!(endpoint, "API success"),
            Err(e) => debug!(endpoint, error = %e, "API error"),
        }
        result
    }

    async fn send(&self, method: Method, url: &str, endpoint: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .request(method, url)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(endpoint, e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(endpoint, e))?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

/// Build the error for a non-2xx response.
///
/// Prefers the backend's own `message` field; falls back to
/// `HTTP <status>: <reason>` when the body is not JSON or has no message.
fn status_error(status: reqwest::StatusCode, body: &str) -> ApiError {
    let fallback = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    let body = serde_json::from_str::<Value>(body)
        .unwrap_or_else(|_| serde_json::json!({ "message": fallback }));

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or(fallback);

    ApiError::Status {
        status: status.as_u16(),
        message,
        body,
    }
}
