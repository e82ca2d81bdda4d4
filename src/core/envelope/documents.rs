use serde::{Deserialize, Serialize};

use crate::core::{envelope::Violations, error::GatewayError};

/// Envelope for `POST documents/summarize-text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeTextRequest {
    pub text: String,
}

impl SummarizeTextRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("text", &self.text);
        violations.finish()?;
        Ok(self)
    }
}

/// Validate a document name used in `DELETE documents/{name}`. Names are
/// backend storage keys; path separators and traversal sequences are
/// rejected at the boundary.
pub fn validate_document_name(name: &str) -> Result<(), GatewayError> {
    let mut violations = Violations::new();
    violations.require_non_empty("name", name);
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        violations.push("name must not contain path separators");
    }
    violations.finish()
}
