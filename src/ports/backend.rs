use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode, header};
use serde_json::Value;
use thiserror::Error;

/// Custom error type for backend client operations.
///
/// Only transport-level failures surface here; error status codes from the
/// backend are returned as data in [`BackendResponse`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// Error when connection to the backend fails (DNS, refused, reset)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error when the request exceeds its timeout
    #[error("Timeout error after {0} seconds")]
    Timeout(u64),

    /// Error when the outgoing request could not be constructed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for backend client operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Raw upstream response: status, headers, and body, exactly as received.
/// Lives only for the duration of one proxied call.
#[derive(Debug)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn the upstream payload into an HTTP response verbatim, preserving
    /// status and content type.
    pub fn into_http_response(self) -> Response<Body> {
        let mut builder = Response::builder().status(self.status);
        if let Some(content_type) = self.headers.get(header::CONTENT_TYPE) {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }
}

/// One file part of a multipart forward: original bytes, filename, and
/// content type, unmodified.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// BackendClient defines the port (interface) for the single outbound call
/// fulfilling a proxied operation.
///
/// Implementations must return 4xx/5xx upstream statuses as `Ok` values and
/// reserve `Err` for transport failures. The inbound header map is filtered
/// through an allowlist before forwarding.
#[async_trait]
pub trait BackendClient: Send + Sync + 'static {
    /// GET the given backend path.
    async fn get(&self, path: &str, headers: &HeaderMap) -> BackendResult<BackendResponse>;

    /// POST a JSON body to the given backend path.
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> BackendResult<BackendResponse>;

    /// POST a multipart form (file parts plus plain text fields) to the
    /// given backend path.
    async fn post_multipart(
        &self,
        path: &str,
        parts: Vec<FilePart>,
        fields: Vec<(String, String)>,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> BackendResult<BackendResponse>;

    /// DELETE the given backend path.
    async fn delete(&self, path: &str, headers: &HeaderMap) -> BackendResult<BackendResponse>;
}
