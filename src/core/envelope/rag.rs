use serde::{Deserialize, Serialize};

use crate::core::{
    envelope::{UserProfile, Violations},
    error::GatewayError,
};

/// Maximum accepted length for a retrieval query.
pub const MAX_QUERY_CHARS: usize = 2_000;

/// Envelope for `POST rag/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAskRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub use_styles: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

impl RagAskRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("query", &self.query);
        violations.check_max_chars("query", &self.query, MAX_QUERY_CHARS);
        if let Some(profile) = &self.user_profile {
            profile.collect_violations(&mut violations);
        }
        violations.finish()?;
        Ok(self)
    }
}

/// Envelope for `POST rag/ingest`: a document or folder reference on the
/// backend's side of the fence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagIngestRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

impl RagIngestRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("path", &self.path);
        violations.finish()?;
        Ok(self)
    }
}
