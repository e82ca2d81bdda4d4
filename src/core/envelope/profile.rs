use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{envelope::Violations, error::GatewayError};

/// Envelope for `POST profile` (upsert). The profile body is owned by the
/// backend and forwarded verbatim apart from the `user_id` key the gateway
/// needs to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpsertRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: serde_json::Map<String, Value>,
}

impl ProfileUpsertRequest {
    pub fn validate(self) -> Result<Self, GatewayError> {
        let mut violations = Violations::new();
        violations.require_non_empty("user_id", &self.user_id);
        violations.finish()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::parse;

    #[test]
    fn test_upsert_forwards_arbitrary_profile_fields() {
        let req: ProfileUpsertRequest = parse(serde_json::json!({
            "user_id": "u-42",
            "directness": 6,
            "department": "support"
        }))
        .unwrap();
        let req = req.validate().unwrap();

        let forwarded = serde_json::to_value(&req).unwrap();
        assert_eq!(forwarded["user_id"], "u-42");
        assert_eq!(forwarded["directness"], 6);
        assert_eq!(forwarded["department"], "support");
    }

    #[test]
    fn test_missing_user_id_rejected() {
        assert!(parse::<ProfileUpsertRequest>(serde_json::json!({"department": "x"})).is_err());

        let req: ProfileUpsertRequest = parse(serde_json::json!({"user_id": ""})).unwrap();
        assert!(req.validate().is_err());
    }
}
