//! Axum middleware layered on every route of the gateway.
//!
//! The timing middleware observes each request/response pair without altering
//! behavior: it logs method, path, final status, and elapsed wall-clock time,
//! and raises the log level when the response carries an error status. The
//! request-id middleware assigns a per-request UUID exposed through tracing
//! and the `X-Request-ID` response header.
use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;

/// Log start/end of every request including latency. Errors pass through
/// unchanged; normalization happens in the error layer, not here.
pub async fn request_timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    tracing::debug!(http.method = %method, http.path = %path, "Request started");

    let response = next.run(req).await;
    let status = response.status();
    let elapsed = start.elapsed();

    if status.is_server_error() {
        tracing::error!(
            http.method = %method,
            http.path = %path,
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            http.method = %method,
            http.path = %path,
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request rejected"
        );
    } else {
        tracing::info!(
            http.method = %method,
            http.path = %path,
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        );
    }

    response
}

/// Generate a per-request UUID and expose it via tracing plus `X-Request-ID`.
/// The id is also placed on the inbound headers so the backend client can
/// forward it for correlation.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        req.headers_mut()
            .entry("x-request-id")
            .or_insert(header_value);
    }

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt; // for oneshot

    use super::*;

    #[tokio::test]
    async fn test_request_id_middleware_sets_header() {
        let app = Router::new()
            .route("/", get(|| async { StatusCode::OK }))
            .layer(middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let request_id = response
            .headers()
            .get("X-Request-ID")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(uuid::Uuid::parse_str(request_id).is_ok());
    }

    #[tokio::test]
    async fn test_timing_middleware_passes_responses_through() {
        let app = Router::new()
            .route("/", get(|| async { (StatusCode::IM_A_TEAPOT, "tea") }))
            .layer(middleware::from_fn(request_timing_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // The interceptor observes but never alters the response.
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
