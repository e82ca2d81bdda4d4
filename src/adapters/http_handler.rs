//! The route controller: the fixed set of proxied operations.
//!
//! Every operation is a pure mapping {inbound path + method} → {envelope} →
//! {backend path}: validate the raw body, issue exactly one backend call, and
//! return the upstream body verbatim on success. No operation fans out to
//! multiple backend calls, aggregates results, or retries. Failures are
//! attached to the request path and leave through the error normalizer.
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, OriginalUri, Path, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    adapters::middleware::{request_id_middleware, request_timing_middleware},
    config::models::GatewayConfig,
    core::{
        envelope::{
            self,
            conversion::ConvertRequest,
            documents::{SummarizeTextRequest, validate_document_name},
            feedback::FeedbackRequest,
            profile::ProfileUpsertRequest,
            quality::QualityAnalyzeRequest,
            rag::{RagAskRequest, RagIngestRequest},
        },
        error::{CanonicalError, ErrorResponse, GatewayError, status_name},
    },
    ports::backend::{BackendClient, BackendResponse, FilePart},
};

/// Shared, request-independent state: the startup-resolved backend client
/// and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendClient>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(backend: Arc<dyn BackendClient>, config: Arc<GatewayConfig>) -> Self {
        Self { backend, config }
    }
}

/// Build the gateway router: the operation table, body limits, CORS for the
/// browser clients, and the globally applied observability middleware.
pub fn build_router(state: AppState) -> Router {
    let json_limit = state.config.limits.max_json_bytes;
    let upload_limit = state.config.limits.max_upload_bytes;

    let json_routes = Router::new()
        .route("/conversion/convert", post(convert))
        .route("/quality/company/analyze", post(quality_analyze))
        .route("/quality/company/options", get(quality_options))
        .route("/rag/ask", post(rag_ask))
        .route("/rag/ingest", post(rag_ingest))
        .route("/profile/{user_id}", get(get_profile))
        .route("/profile", post(upsert_profile))
        .route("/documents", get(list_documents))
        .route("/documents/{name}", delete(delete_document))
        .route("/documents/summarize-text", post(summarize_text))
        .route("/feedback", post(submit_feedback))
        .layer(DefaultBodyLimit::max(json_limit));

    // Upload routes get the larger multipart limit; everything oversized is
    // rejected here, before any backend call.
    let upload_routes = Router::new()
        .route("/documents/upload", post(upload_documents))
        .route("/documents/summarize-pdf", post(summarize_pdf))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/health", get(health))
        .nest("/api", json_routes.merge(upload_routes))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(request_timing_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Deserialize the inbound JSON body into an operation envelope. Oversized
/// bodies map to 413, everything else malformed to a validation failure.
fn json_envelope<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
    limit: usize,
) -> Result<T, GatewayError> {
    let Json(value) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge { limit }
        } else {
            GatewayError::validation(vec![rejection.body_text()])
        }
    })?;
    envelope::parse(value)
}

/// A 2xx upstream response passes through verbatim; anything else becomes an
/// upstream error for the normalizer.
fn ensure_success(response: BackendResponse) -> Result<Response, GatewayError> {
    if response.is_success() {
        Ok(response.into_http_response())
    } else {
        Err(GatewayError::Upstream {
            status: response.status,
            body: response.body,
        })
    }
}

fn multipart_failure(err: MultipartError, limit: usize) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge { limit }
    } else {
        GatewayError::validation(vec![format!("Invalid multipart body: {}", err.body_text())])
    }
}

/// Drain a multipart stream into file parts (bytes, filename, content type
/// unmodified) and plain text fields, enforcing the upload limit locally.
async fn collect_multipart(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<(Vec<FilePart>, Vec<(String, String)>), GatewayError> {
    let mut parts = Vec::new();
    let mut fields = Vec::new();
    let mut total_bytes = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(e, limit))?
    {
        let field_name = field.name().unwrap_or("files").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_failure(e, limit))?;

            total_bytes += bytes.len();
            if total_bytes > limit {
                return Err(GatewayError::PayloadTooLarge { limit });
            }

            parts.push(FilePart {
                field_name,
                file_name,
                content_type,
                bytes,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| multipart_failure(e, limit))?;
            fields.push((field_name, text));
        }
    }

    Ok((parts, fields))
}

// ---------------------------------------------------------------------------
// Operation handlers
// ---------------------------------------------------------------------------

async fn convert(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<ConvertRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/conversion/convert",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn quality_analyze(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<QualityAnalyzeRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/quality/company/analyze",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn quality_options(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let response = state
            .backend
            .get("/quality/company/options", &headers)
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn rag_ask(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req =
            json_envelope::<RagAskRequest>(body, state.config.limits.max_json_bytes)?.validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/rag/ask",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn rag_ingest(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<RagIngestRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        // Ingestion walks document stores on the backend side; it gets the
        // longer timeout.
        let response = state
            .backend
            .post_json(
                "/rag/ingest",
                &payload,
                &headers,
                state.config.ingest_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn get_profile(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let response = state
            .backend
            .get(&format!("/profile/{user_id}"), &headers)
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn upsert_profile(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<ProfileUpsertRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/profile",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn list_documents(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let response = state.backend.get("/documents", &headers).await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn delete_document(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        validate_document_name(&name)?;
        let response = state
            .backend
            .delete(&format!("/documents/{name}"), &headers)
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn upload_documents(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let limit = state.config.limits.max_upload_bytes;
        let (parts, fields) = collect_multipart(&mut multipart, limit).await?;
        if parts.is_empty() {
            return Err(GatewayError::validation(vec![
                "at least one file is required".to_string(),
            ]));
        }
        let response = state
            .backend
            .post_multipart(
                "/documents/upload",
                parts,
                fields,
                &headers,
                state.config.ingest_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn summarize_pdf(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let limit = state.config.limits.max_upload_bytes;
        let (parts, fields) = collect_multipart(&mut multipart, limit).await?;
        if parts.is_empty() {
            return Err(GatewayError::validation(vec![
                "a PDF file is required".to_string(),
            ]));
        }
        let response = state
            .backend
            .post_multipart(
                "/documents/summarize-pdf",
                parts,
                fields,
                &headers,
                state.config.ingest_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn summarize_text(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<SummarizeTextRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/documents/summarize-text",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

async fn submit_feedback(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let outcome = async {
        let req = json_envelope::<FeedbackRequest>(body, state.config.limits.max_json_bytes)?
            .validate()?;
        let payload = serde_json::to_value(&req)?;
        let response = state
            .backend
            .post_json(
                "/feedback",
                &payload,
                &headers,
                state.config.request_timeout(),
            )
            .await?;
        ensure_success(response)
    };
    outcome.await.map_err(|e| e.at(uri.path()))
}

/// Local health endpoint; not proxied.
async fn health() -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "service": "textgate",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Unknown paths also answer in the canonical shape.
async fn not_found(OriginalUri(uri): OriginalUri) -> ErrorResponse {
    GatewayError::Canonical(CanonicalError {
        status_code: 404,
        message: "No such operation".to_string(),
        error: status_name(404).to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        path: uri.path().to_string(),
        details: None,
    })
    .at(uri.path())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use http::Request;
    use tower::ServiceExt; // for oneshot

    use super::*;
    use crate::adapters::backend_client::ReqwestBackendClient;

    fn test_state() -> AppState {
        // Port 9 (discard) is assumed closed; these tests never reach it.
        let backend = Arc::new(
            ReqwestBackendClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
        );
        AppState::new(backend, Arc::new(GatewayConfig::default()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "textgate");
    }

    #[tokio::test]
    async fn test_unknown_path_returns_canonical_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["path"], "/api/nope");
    }

    #[tokio::test]
    async fn test_invalid_body_never_reaches_backend() {
        // The backend address is unroutable; a validation failure must still
        // come back as a clean 400, proving no call was attempted.
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/conversion/convert")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "text must not be empty");
    }
}
