use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use http::{HeaderMap, header};
use serde_json::Value;
use url::Url;

use crate::ports::backend::{
    BackendClient, BackendError, BackendResponse, BackendResult, FilePart,
};

/// Inbound headers forwarded to the backend. Everything else (cookies,
/// host, forwarded-for chains) stops at the gateway.
static FORWARDED_HEADERS: [header::HeaderName; 3] = [
    header::AUTHORIZATION,
    header::ACCEPT,
    header::HeaderName::from_static("x-request-id"),
];

/// Backend client adapter using reqwest (JSON + multipart forwarding).
///
/// Responsibilities:
/// * Holds the backend base URL resolved once at process start
/// * Applies a per-call timeout so a slow backend cannot hang the gateway
/// * Filters inbound headers through the forwarding allowlist
/// * Returns 4xx/5xx upstream statuses as data; only transport failures error
pub struct ReqwestBackendClient {
    client: reqwest::Client,
    base_url: String,
    default_timeout: Duration,
}

impl ReqwestBackendClient {
    /// Create a new backend client. The base URL is validated here and is
    /// immutable for the life of the process.
    pub fn new(base_url: &str, default_timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .wrap_err_with(|| format!("Invalid backend base URL: {base_url}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            eyre::bail!("Backend base URL must be http(s): {base_url}");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .wrap_err("Failed to build reqwest client")?;

        tracing::info!(backend = %base_url, "Created backend client");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Copy only allowlisted headers from the inbound request.
    fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
        let mut forwarded = HeaderMap::new();
        for name in &FORWARDED_HEADERS {
            if let Some(value) = inbound.get(name) {
                forwarded.insert(name.clone(), value.clone());
            }
        }
        forwarded
    }

    fn map_transport_error(err: reqwest::Error, timeout: Duration) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(timeout.as_secs())
        } else if err.is_builder() || err.is_request() {
            BackendError::InvalidRequest(err.to_string())
        } else {
            BackendError::Connection(err.to_string())
        }
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> BackendResult<BackendResponse> {
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(e, timeout))?;

        tracing::debug!(status = %status, bytes = body.len(), "Backend response received");
        Ok(BackendResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl BackendClient for ReqwestBackendClient {
    async fn get(&self, path: &str, headers: &HeaderMap) -> BackendResult<BackendResponse> {
        let builder = self
            .client
            .get(self.endpoint(path))
            .headers(Self::forward_headers(headers));
        self.execute(builder, self.default_timeout).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> BackendResult<BackendResponse> {
        let builder = self
            .client
            .post(self.endpoint(path))
            .headers(Self::forward_headers(headers))
            .json(body);
        self.execute(builder, timeout).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        parts: Vec<FilePart>,
        fields: Vec<(String, String)>,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> BackendResult<BackendResponse> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            // Original bytes, filename, and content type pass through
            // unmodified.
            let file = reqwest::multipart::Part::bytes(part.bytes.to_vec())
                .file_name(part.file_name)
                .mime_str(&part.content_type)
                .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
            form = form.part(part.field_name, file);
        }
        for (name, value) in fields {
            form = form.text(name, value);
        }

        let builder = self
            .client
            .post(self.endpoint(path))
            .headers(Self::forward_headers(headers))
            .multipart(form);
        self.execute(builder, timeout).await
    }

    async fn delete(&self, path: &str, headers: &HeaderMap) -> BackendResult<BackendResponse> {
        let builder = self
            .client
            .delete(self.endpoint(path))
            .headers(Self::forward_headers(headers));
        self.execute(builder, self.default_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn test_client_rejects_non_http_base_url() {
        assert!(ReqwestBackendClient::new("ftp://backend", Duration::from_secs(5)).is_err());
        assert!(ReqwestBackendClient::new("not a url", Duration::from_secs(5)).is_err());
        assert!(ReqwestBackendClient::new("http://backend:8000", Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client =
            ReqwestBackendClient::new("http://backend:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("/conversion/convert"),
            "http://backend:8000/conversion/convert"
        );
    }

    #[test]
    fn test_header_allowlist_drops_everything_else() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        inbound.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        inbound.insert("x-request-id", HeaderValue::from_static("abc-123"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("session=secret"));
        inbound.insert(header::HOST, HeaderValue::from_static("gateway.local"));
        inbound.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));

        let forwarded = ReqwestBackendClient::forward_headers(&inbound);
        assert_eq!(forwarded.len(), 3);
        assert!(forwarded.contains_key(header::AUTHORIZATION));
        assert!(forwarded.contains_key(header::ACCEPT));
        assert!(forwarded.contains_key("x-request-id"));
        assert!(!forwarded.contains_key(header::COOKIE));
        assert!(!forwarded.contains_key(header::HOST));
        assert!(!forwarded.contains_key("x-forwarded-for"));
    }

    #[tokio::test]
    async fn test_error_status_is_returned_as_data() {
        use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/documents"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = ReqwestBackendClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let response = client.get("/documents", &HeaderMap::new()).await.unwrap();
        assert_eq!(response.status.as_u16(), 503);
        assert_eq!(&response.body[..], b"down");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is assumed closed.
        let client =
            ReqwestBackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.get("/documents", &HeaderMap::new()).await;
        assert!(matches!(
            result,
            Err(BackendError::Connection(_)) | Err(BackendError::Timeout(_))
        ));
    }
}
