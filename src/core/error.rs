//! Canonical error envelope and the single normalization point.
//!
//! Every failure the gateway can produce, whether a validation failure, an
//! upstream error status, a transport failure, or anything unanticipated, is
//! funneled
//! through [`normalize`] and leaves the process as one JSON shape. Handlers
//! never build error payloads themselves.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ports::backend::BackendError;

/// Placeholder substituted for `details` on 4xx responses. Client errors echo
/// client input, so the structured payload is withheld; 5xx responses are
/// operator-facing and keep full details.
pub const WITHHELD_DETAILS: &str = "Details withheld for client errors";

/// The single normalized JSON shape returned for every failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalError {
    pub status_code: u16,
    pub message: String,
    /// HTTP status name, e.g. "Bad Request".
    pub error: String,
    /// ISO-8601 timestamp of normalization.
    pub timestamp: String,
    /// Request path the failure occurred on.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Failure taxonomy for one proxied request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client payload violates an operation's schema. Always 4xx, carries one
    /// message per violated constraint.
    #[error("Validation failed: {}", violations.join("; "))]
    Validation { violations: Vec<String> },

    /// The backend responded with an error status. Status and body are kept
    /// as data so the normalizer can mirror them.
    #[error("Backend returned status {status}")]
    Upstream { status: StatusCode, body: Bytes },

    /// The backend could not be reached at all.
    #[error(transparent)]
    Transport(#[from] BackendError),

    /// An inbound body exceeded a locally enforced size limit.
    #[error("Payload exceeds the maximum allowed size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// An already-normalized error. Normalizing again is the identity.
    #[error("{}", .0.message)]
    Canonical(CanonicalError),

    /// Anything unanticipated. The detail is logged, never returned.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl GatewayError {
    pub fn validation(violations: Vec<String>) -> Self {
        Self::Validation { violations }
    }

    /// Attach the request path, producing a responder that runs the
    /// normalizer on the way out.
    pub fn at(self, path: &str) -> ErrorResponse {
        ErrorResponse {
            error: self,
            path: path.to_string(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(format!("JSON serialization failed: {err}"))
    }
}

/// Fixed status-code-to-name table. Unknown codes map to a generic name.
pub fn status_name(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

/// Extract a human-readable message from an upstream error body, trying the
/// conventional fields in order, and keep the parsed body for `details`.
fn upstream_message(body: &Bytes) -> (String, Option<Value>) {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    if let Some(Value::Object(map)) = &parsed {
        for field in ["message", "detail", "error"] {
            if let Some(Value::String(text)) = map.get(field) {
                if !text.is_empty() {
                    return (text.clone(), parsed.clone());
                }
            }
        }
    }

    let details = match parsed {
        Some(value) => Some(value),
        None if body.is_empty() => None,
        None => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    };
    ("The backend returned an error".to_string(), details)
}

/// 4xx responses never carry structured details; 5xx responses keep them.
fn sanitize_details(status_code: u16, details: Option<Value>) -> Option<Value> {
    if (400..500).contains(&status_code) {
        details.map(|_| Value::String(WITHHELD_DETAILS.to_string()))
    } else {
        details
    }
}

/// Convert any [`GatewayError`] into the canonical envelope. Ordered case
/// analysis, first match wins; see the taxonomy on [`GatewayError`].
pub fn normalize(error: GatewayError, path: &str) -> CanonicalError {
    let (status_code, message, details) = match error {
        // Already canonical: reproduce unchanged.
        GatewayError::Canonical(canonical) => return canonical,

        GatewayError::Validation { violations } => {
            // Always 400, so the placeholder is attached directly instead of
            // a structured violation list sanitization would discard.
            let details = Some(Value::String(WITHHELD_DETAILS.to_string()));
            (400, violations.join("; "), details)
        }

        GatewayError::Upstream { status, body } => {
            let (message, details) = upstream_message(&body);
            (status.as_u16(), message, details)
        }

        // Transport failures map to 500 with a generic message; the raw
        // socket or timeout text is logged upstream of here, never returned.
        GatewayError::Transport(BackendError::Timeout(_)) => {
            (500, "The backend request timed out".to_string(), None)
        }
        GatewayError::Transport(BackendError::Connection(_)) => (
            500,
            "Could not reach the backend service".to_string(),
            None,
        ),
        GatewayError::Transport(BackendError::InvalidRequest(_)) => {
            (500, "An unexpected error occurred".to_string(), None)
        }

        GatewayError::PayloadTooLarge { limit } => (
            413,
            format!("Payload exceeds the maximum allowed size of {limit} bytes"),
            None,
        ),

        GatewayError::Unexpected(_) => (500, "An unexpected error occurred".to_string(), None),
    };

    CanonicalError {
        status_code,
        message,
        error: status_name(status_code).to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        path: path.to_string(),
        details: sanitize_details(status_code, details),
    }
}

/// A [`GatewayError`] bound to its request path; the `IntoResponse` impl is
/// the one place error responses are produced.
pub struct ErrorResponse {
    error: GatewayError,
    path: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        // Log full detail before sanitization so operators keep the context
        // clients are not shown.
        match &self.error {
            GatewayError::Unexpected(detail) => {
                tracing::error!(path = %self.path, detail = %detail, "Unexpected failure");
            }
            GatewayError::Transport(err) => {
                tracing::error!(path = %self.path, error = %err, "Backend transport failure");
            }
            GatewayError::Upstream { status, .. } => {
                tracing::warn!(path = %self.path, status = %status, "Backend error status");
            }
            other => {
                tracing::warn!(path = %self.path, error = %other, "Request failed");
            }
        }

        let canonical = normalize(self.error, &self.path);
        let status = StatusCode::from_u16(canonical.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(canonical)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_name_table() {
        assert_eq!(status_name(400), "Bad Request");
        assert_eq!(status_name(401), "Unauthorized");
        assert_eq!(status_name(403), "Forbidden");
        assert_eq!(status_name(404), "Not Found");
        assert_eq!(status_name(422), "Unprocessable Entity");
        assert_eq!(status_name(500), "Internal Server Error");
        assert_eq!(status_name(502), "Bad Gateway");
        assert_eq!(status_name(503), "Service Unavailable");
        assert_eq!(status_name(418), "Error");
        assert_eq!(status_name(599), "Error");
    }

    #[test]
    fn test_validation_error_collects_all_violations() {
        let error = GatewayError::validation(vec![
            "text must not be empty".to_string(),
            "user_id is required".to_string(),
        ]);
        let canonical = normalize(error, "/api/quality/company/analyze");

        assert_eq!(canonical.status_code, 400);
        assert_eq!(canonical.error, "Bad Request");
        assert_eq!(
            canonical.message,
            "text must not be empty; user_id is required"
        );
        assert_eq!(canonical.path, "/api/quality/company/analyze");
        // 4xx: structured details are withheld.
        assert_eq!(
            canonical.details,
            Some(Value::String(WITHHELD_DETAILS.to_string()))
        );
    }

    #[test]
    fn test_upstream_5xx_retains_details() {
        let body = Bytes::from_static(br#"{"detail":"service unavailable"}"#);
        let error = GatewayError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body,
        };
        let canonical = normalize(error, "/api/rag/ask");

        assert_eq!(canonical.status_code, 503);
        assert_eq!(canonical.error, "Service Unavailable");
        assert_eq!(canonical.message, "service unavailable");
        assert_eq!(
            canonical.details,
            Some(serde_json::json!({"detail": "service unavailable"}))
        );
    }

    #[test]
    fn test_upstream_4xx_withholds_details() {
        let body = Bytes::from_static(br#"{"message":"unknown document"}"#);
        let error = GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            body,
        };
        let canonical = normalize(error, "/api/documents/missing.pdf");

        assert_eq!(canonical.status_code, 404);
        assert_eq!(canonical.message, "unknown document");
        assert_eq!(
            canonical.details,
            Some(Value::String(WITHHELD_DETAILS.to_string()))
        );
    }

    #[test]
    fn test_upstream_message_field_precedence() {
        let body = Bytes::from_static(br#"{"error":"c","detail":"b","message":"a"}"#);
        let (message, _) = upstream_message(&body);
        assert_eq!(message, "a");

        let body = Bytes::from_static(br#"{"error":"c","detail":"b"}"#);
        let (message, _) = upstream_message(&body);
        assert_eq!(message, "b");

        let body = Bytes::from_static(br#"{"error":"c"}"#);
        let (message, _) = upstream_message(&body);
        assert_eq!(message, "c");

        let body = Bytes::from_static(br#"{"code":17}"#);
        let (message, _) = upstream_message(&body);
        assert_eq!(message, "The backend returned an error");
    }

    #[test]
    fn test_transport_failure_never_leaks_socket_text() {
        let error = GatewayError::Transport(BackendError::Connection(
            "tcp connect error: Connection refused (os error 111)".to_string(),
        ));
        let canonical = normalize(error, "/api/conversion/convert");

        assert_eq!(canonical.status_code, 500);
        assert_eq!(canonical.message, "Could not reach the backend service");
        assert!(!canonical.message.contains("os error"));
        assert!(canonical.details.is_none());
    }

    #[test]
    fn test_timeout_maps_to_generic_500() {
        let error = GatewayError::Transport(BackendError::Timeout(30));
        let canonical = normalize(error, "/api/rag/ask");

        assert_eq!(canonical.status_code, 500);
        assert_eq!(canonical.message, "The backend request timed out");
    }

    #[test]
    fn test_normalize_is_idempotent_on_canonical_errors() {
        let first = normalize(
            GatewayError::validation(vec!["query is required".to_string()]),
            "/api/rag/ask",
        );
        let second = normalize(GatewayError::Canonical(first.clone()), "/elsewhere");
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_error_serializes_camel_case() {
        let canonical = normalize(
            GatewayError::Unexpected("boom".to_string()),
            "/api/feedback",
        );
        let value = serde_json::to_value(&canonical).unwrap();

        assert!(value.get("statusCode").is_some());
        assert!(value.get("message").is_some());
        assert!(value.get("error").is_some());
        assert!(value.get("timestamp").is_some());
        assert!(value.get("path").is_some());
        // No details for unexpected errors, and the field is omitted.
        assert!(value.get("details").is_none());
        // The real detail is never part of the payload.
        assert!(!value.to_string().contains("boom"));
    }
}
