use serde::{Deserialize, Serialize};

use crate::core::{envelope::Violations, error::GatewayError};

/// Maximum accepted length for the text to analyze.
pub const MAX_TEXT_CHARS: usize = 5_000;

/// Closed set of audience categories the backend scores against.
pub const TARGET_AUDIENCES: &[&str] = &[
    "colleagues",
    "management",
    "customers",
    "new_hires",
    "executives",
];

/// Closed set of communication contexts.
pub const CONTEXTS: &[&str] = &[
    "email",
    "chat",
    "documentation",
    "meeting_notes",
    "announcement",
];

fn default_detailed() -> bool {
    false
}

/// Envelope for `POST quality/company/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAnalyzeRequest {
    pub text: String,
    pub target_audience: String,
    pub context: String,
    pub company_id: String,
    pub user_id: String,
    #[serde(default = "default_detailed")]
    pub detailed: bool,
}

impl QualityAnalyzeRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("text", &self.text);
        violations.check_max_chars("text", &self.text, MAX_TEXT_CHARS);
        violations.check_one_of("target_audience", &self.target_audience, TARGET_AUDIENCES);
        violations.check_one_of("context", &self.context, CONTEXTS);
        violations.require_non_empty("company_id", &self.company_id);
        violations.require_non_empty("user_id", &self.user_id);
        violations.finish()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::parse;

    fn valid_body() -> serde_json::Value {
        serde_json::json!({
            "text": "Quarterly numbers look strong.",
            "target_audience": "management",
            "context": "email",
            "company_id": "acme",
            "user_id": "u-17"
        })
    }

    #[test]
    fn test_valid_request_applies_detailed_default() {
        let req: QualityAnalyzeRequest = parse(valid_body()).unwrap();
        let req = req.validate().unwrap();
        assert!(!req.detailed);
    }

    #[test]
    fn test_empty_text_lists_the_violation() {
        let mut body = valid_body();
        body["text"] = serde_json::json!("");
        let req: QualityAnalyzeRequest = parse(body).unwrap();
        match req.validate().unwrap_err() {
            GatewayError::Validation { violations } => {
                assert!(violations.contains(&"text must not be empty".to_string()));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_audience_outside_closed_set_rejected() {
        let mut body = valid_body();
        body["target_audience"] = serde_json::json!("strangers");
        let req: QualityAnalyzeRequest = parse(body).unwrap();
        match req.validate().unwrap_err() {
            GatewayError::Validation { violations } => {
                assert!(violations[0].starts_with("target_audience must be one of"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_violations_collected_at_once() {
        let req: QualityAnalyzeRequest = parse(serde_json::json!({
            "text": "",
            "target_audience": "nobody",
            "context": "smoke_signal",
            "company_id": "",
            "user_id": ""
        }))
        .unwrap();
        match req.validate().unwrap_err() {
            GatewayError::Validation { violations } => assert_eq!(violations.len(), 5),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_text_over_limit_rejected() {
        let mut body = valid_body();
        body["text"] = serde_json::json!("x".repeat(MAX_TEXT_CHARS + 1));
        let req: QualityAnalyzeRequest = parse(body).unwrap();
        assert!(req.validate().is_err());
    }
}
