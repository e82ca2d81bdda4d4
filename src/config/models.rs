//! Configuration data structures for textgate.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files
//! and to `TEXTGATE_*` environment variables. They are serde-friendly and
//! include defaults so that minimal configs remain concise.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend base URL used when none is configured in development mode.
/// Production mode never falls back to this; a missing URL fails startup.
pub const DEV_BACKEND_URL: &str = "http://127.0.0.1:8000";

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ingest_timeout_secs() -> u64 {
    120
}

fn default_max_json_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024 // 25 MiB
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Runtime mode. Determines logging format and whether a missing backend
/// URL is fatal at startup.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

/// Configuration for the outbound backend connection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the text-processing backend. Required in production.
    pub base_url: Option<String>,
    /// Timeout for text operations (conversion, analysis, RAG queries)
    pub request_timeout_secs: u64,
    /// Timeout for document ingestion and uploads
    pub ingest_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            ingest_timeout_secs: default_ingest_timeout_secs(),
        }
    }
}

/// Body-size limits enforced at the gateway boundary, before any backend
/// call is made.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum JSON body size in bytes
    pub max_json_bytes: usize,
    /// Maximum multipart upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_json_bytes: default_max_json_bytes(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    /// Log filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Emit JSON-formatted logs instead of the console format
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub mode: RunMode,
    pub backend: BackendConfig,
    pub limits: LimitsConfig,
    pub log: LogConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            mode: RunMode::default(),
            backend: BackendConfig::default(),
            limits: LimitsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Resolve the backend base URL once at startup. Development mode falls
    /// back to the loopback default; production with no URL is rejected by
    /// config validation before this is ever called.
    pub fn backend_base_url(&self) -> String {
        self.backend
            .base_url
            .clone()
            .unwrap_or_else(|| DEV_BACKEND_URL.to_string())
    }

    /// Timeout applied to text operations.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Timeout applied to document ingestion and uploads.
    pub fn ingest_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.ingest_timeout_secs)
    }
}
