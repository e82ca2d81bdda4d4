use serde::{Deserialize, Serialize};

use crate::core::{
    envelope::{UserProfile, Violations},
    error::GatewayError,
};

/// Maximum accepted length for the text to convert.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Envelope for `POST conversion/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_preferences: Option<Vec<String>>,
}

impl ConvertRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("text", &self.text);
        violations.check_max_chars("text", &self.text, MAX_TEXT_CHARS);
        if let Some(profile) = &self.user_profile {
            profile.collect_violations(&mut violations);
        }
        violations.finish()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::parse;

    #[test]
    fn test_minimal_valid_request() {
        let req: ConvertRequest =
            parse(serde_json::json!({"text": "please review this"})).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_text_rejected() {
        let req: ConvertRequest = parse(serde_json::json!({"text": "   "})).unwrap();
        match req.validate().unwrap_err() {
            GatewayError::Validation { violations } => {
                assert!(violations.contains(&"text must not be empty".to_string()));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_text_rejected() {
        assert!(parse::<ConvertRequest>(serde_json::json!({"context": "email"})).is_err());
    }

    #[test]
    fn test_profile_scale_out_of_range_rejected() {
        let req: ConvertRequest = parse(serde_json::json!({
            "text": "hello",
            "user_profile": {"directness": 11}
        }))
        .unwrap();
        match req.validate().unwrap_err() {
            GatewayError::Validation { violations } => {
                assert!(violations[0].contains("between 1 and 10"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_text_rejected() {
        let req: ConvertRequest =
            parse(serde_json::json!({"text": "x".repeat(MAX_TEXT_CHARS + 1)})).unwrap();
        assert!(req.validate().is_err());
    }
}
