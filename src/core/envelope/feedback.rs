use serde::{Deserialize, Serialize};

use crate::core::{
    envelope::{UserProfile, Violations},
    error::GatewayError,
};

/// Maximum accepted length for submitted feedback.
pub const MAX_FEEDBACK_CHARS: usize = 5_000;

/// Envelope for `POST feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub feedback_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

impl FeedbackRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("feedback_text", &self.feedback_text);
        violations.check_max_chars("feedback_text", &self.feedback_text, MAX_FEEDBACK_CHARS);
        if let Some(profile) = &self.user_profile {
            profile.collect_violations(&mut violations);
        }
        violations.finish()?;
        Ok(self)
    }
}
