//! Typed request envelopes for every proxied operation.
//!
//! Untrusted JSON is deserialized into one of these structs and then run
//! through a validation pass that collects **every** violated constraint,
//! not just the first. Validation happens before any backend call; the
//! backend never sees an invalid envelope. All of this is pure
//! transformation with no side effects.
pub mod conversion;
pub mod documents;
pub mod feedback;
pub mod profile;
pub mod quality;
pub mod rag;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::core::error::GatewayError;

/// Deserialize an inbound JSON value into an operation's raw envelope.
/// Structural problems (wrong types, missing required fields) surface as a
/// single-message validation failure carrying the serde diagnostic.
pub fn parse<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value)
        .map_err(|err| GatewayError::validation(vec![format!("Invalid request body: {err}")]))
}

/// Accumulates one message per violated constraint.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{field} must not be empty"));
        }
    }

    pub fn check_max_chars(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.0
                .push(format!("{field} must be at most {max} characters"));
        }
    }

    /// Closed-set check for enumerated fields: anything outside the set is
    /// rejected, never coerced.
    pub fn check_one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.0.push(format!(
                "{field} must be one of: {}",
                allowed.join(", ")
            ));
        }
    }

    /// Range check for 1-10 scale fields; 0 and 11 are rejected.
    pub fn check_scale(&mut self, field: &str, value: Option<i64>) {
        if let Some(n) = value {
            if !(1..=10).contains(&n) {
                self.0.push(format!("{field} must be between 1 and 10"));
            }
        }
    }

    pub fn finish(self) -> Result<(), GatewayError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Validation { violations: self.0 })
        }
    }
}

/// Tone-profile object attached to several operations. Scale fields are
/// 1-10; unknown keys are forwarded untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directness: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formality: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_style: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl UserProfile {
    pub fn collect_violations(&self, violations: &mut Violations) {
        violations.check_scale("user_profile.directness", self.directness);
        violations.check_scale("user_profile.formality", self.formality);
        violations.check_scale("user_profile.warmth", self.warmth);
    }
}
