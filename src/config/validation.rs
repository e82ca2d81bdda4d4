use std::net::SocketAddr;

use url::Url;

use crate::config::models::{GatewayConfig, RunMode};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ConfigValidationError>;

/// Configuration validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ConfigValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        // A production gateway must never silently proxy to a developer
        // machine; the backend URL has to be explicit.
        match &config.backend.base_url {
            None if config.mode == RunMode::Production => {
                errors.push(ConfigValidationError::MissingField {
                    field: "backend.base_url (required in production mode)".to_string(),
                });
            }
            Some(url) => {
                if let Err(e) = Self::validate_backend_url(url) {
                    errors.push(e);
                }
            }
            None => {}
        }

        if config.backend.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::InvalidField {
                field: "backend.request_timeout_secs".to_string(),
                message: "Timeout must be greater than zero".to_string(),
            });
        }
        if config.backend.ingest_timeout_secs == 0 {
            errors.push(ConfigValidationError::InvalidField {
                field: "backend.ingest_timeout_secs".to_string(),
                message: "Timeout must be greater than zero".to_string(),
            });
        }

        if config.limits.max_json_bytes == 0 {
            errors.push(ConfigValidationError::InvalidField {
                field: "limits.max_json_bytes".to_string(),
                message: "Body size limit must be greater than zero".to_string(),
            });
        }
        if config.limits.max_upload_bytes == 0 {
            errors.push(ConfigValidationError::InvalidField {
                field: "limits.max_upload_bytes".to_string(),
                message: "Body size limit must be greater than zero".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ConfigValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:8080' or '0.0.0.0:3000')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate that the backend URL is an absolute http(s) URL
    fn validate_backend_url(url: &str) -> ValidationResult<()> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
            Ok(parsed) => Err(ConfigValidationError::InvalidField {
                field: "backend.base_url".to_string(),
                message: format!("Unsupported scheme '{}'", parsed.scheme()),
            }),
            Err(e) => Err(ConfigValidationError::InvalidField {
                field: "backend.base_url".to_string(),
                message: format!("Not a valid URL: {e}"),
            }),
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ConfigValidationError>) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
