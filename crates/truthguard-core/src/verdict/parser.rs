//! Verdict parsing from raw model output.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::schema::validate_verdict_schema;

/// Upper bound for both verdict scores.
pub const MAX_SCORE: u8 = 100;

/// Errors that void a model verdict.
#[derive(Error, Debug)]
pub enum VerdictError {
    #[error("Model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model output failed schema validation: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Invalid verdict: {0}")]
    Invalid(String),
}

/// The closed set of verdict labels.
///
/// `category` carries the topic and `Scope` carries the partition, so neither
/// topic tags nor "Local"/"Global" are accepted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    Real,
    Fake,
    Misleading,
    Unverified,
    Satire,
}

impl VerdictLabel {
    /// All labels, in the order they are offered to the model.
    pub const ALL: [VerdictLabel; 5] = [
        VerdictLabel::Real,
        VerdictLabel::Fake,
        VerdictLabel::Misleading,
        VerdictLabel::Unverified,
        VerdictLabel::Satire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Real => "Real",
            VerdictLabel::Fake => "Fake",
            VerdictLabel::Misleading => "Misleading",
            VerdictLabel::Unverified => "Unverified",
            VerdictLabel::Satire => "Satire",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictLabel {
    type Err = VerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerdictLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| VerdictError::Invalid(format!("unknown verdict label '{}'", s)))
    }
}

/// Structured model judgment on a claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Veracity label
    #[serde(rename = "verdict")]
    pub label: VerdictLabel,

    /// How likely the claim is true (0-100)
    #[serde(deserialize_with = "deserialize_score")]
    pub truth_score: u8,

    /// How strongly the claim reads as manipulation (0-100)
    #[serde(deserialize_with = "deserialize_score")]
    pub propaganda_score: u8,

    /// Short topic tag (Politics, Economy, ...)
    pub category: String,

    /// Short explanation of the judgment
    pub explanation: String,

    /// Optional keywords for an illustrative image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_keywords: Option<String>,
}

/// Accept any integral JSON number, so `85` and `85.0` both land as 85.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    let value = match number.as_u64() {
        Some(v) => Some(v),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(MAX_SCORE)).contains(f))
            .map(|f| f as u64),
    };

    value
        .filter(|v| *v <= u64::from(MAX_SCORE))
        .map(|v| v as u8)
        .ok_or_else(|| de::Error::custom(format!("score {} is not an integer in 0..=100", number)))
}

impl Verdict {
    /// Parse and validate raw model output.
    ///
    /// The text must be a single JSON object that satisfies the verdict
    /// schema. Anything else voids the verdict; nothing is defaulted.
    pub fn from_model_output(raw: &str) -> Result<Self, VerdictError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, VerdictError> {
        validate_verdict_schema(&value).map_err(VerdictError::Schema)?;
        let verdict: Verdict = serde_json::from_value(value)?;
        verdict.validate()?;
        Ok(verdict)
    }

    /// Check invariants that survive deserialization.
    pub fn validate(&self) -> Result<(), VerdictError> {
        if self.truth_score > MAX_SCORE {
            return Err(VerdictError::Invalid(format!(
                "truthScore {} out of range",
                self.truth_score
            )));
        }

        if self.propaganda_score > MAX_SCORE {
            return Err(VerdictError::Invalid(format!(
                "propagandaScore {} out of range",
                self.propaganda_score
            )));
        }

        if self.category.trim().is_empty() {
            return Err(VerdictError::Invalid("category is empty".to_string()));
        }

        if self.explanation.trim().is_empty() {
            return Err(VerdictError::Invalid("explanation is empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid_output() {
        let raw = r#"{
            "verdict": "Misleading",
            "truthScore": 35,
            "propagandaScore": 60,
            "category": "Economy",
            "explanation": "Figures are taken out of context.",
            "imageKeywords": "rupee inflation"
        }"#;

        let verdict = Verdict::from_model_output(raw).unwrap();
        assert_eq!(verdict.label, VerdictLabel::Misleading);
        assert_eq!(verdict.truth_score, 35);
        assert_eq!(verdict.propaganda_score, 60);
        assert_eq!(verdict.image_keywords.as_deref(), Some("rupee inflation"));
    }

    #[test]
    fn test_malformed_json_is_void() {
        let result = Verdict::from_model_output("{\"verdict\": \"Real\", ");
        assert!(matches!(result, Err(VerdictError::Json(_))));
    }

    #[test]
    fn test_missing_field_is_void() {
        let raw = r#"{"verdict": "Real", "truthScore": 90, "propagandaScore": 5}"#;
        assert!(matches!(
            Verdict::from_model_output(raw),
            Err(VerdictError::Schema(_))
        ));
    }

    #[test]
    fn test_out_of_range_score_is_void() {
        let raw = r#"{
            "verdict": "Fake",
            "truthScore": 250,
            "propagandaScore": 5,
            "category": "Politics",
            "explanation": "No outlet reports it."
        }"#;
        assert!(Verdict::from_model_output(raw).is_err());
    }

    #[test]
    fn test_integral_float_score_is_accepted() {
        let raw = r#"{
            "verdict": "Real",
            "truthScore": 85.0,
            "propagandaScore": 0.0,
            "category": "Politics",
            "explanation": "Confirmed by two outlets."
        }"#;
        let verdict = Verdict::from_model_output(raw).unwrap();
        assert_eq!(verdict.truth_score, 85);
        assert_eq!(verdict.propaganda_score, 0);
    }

    #[test]
    fn test_fractional_score_is_void() {
        let raw = r#"{
            "verdict": "Real",
            "truthScore": 85.5,
            "propagandaScore": 5,
            "category": "Politics",
            "explanation": "Confirmed by two outlets."
        }"#;
        assert!(Verdict::from_model_output(raw).is_err());
    }

    #[test]
    fn test_blank_explanation_is_void() {
        let raw = r#"{
            "verdict": "Fake",
            "truthScore": 5,
            "propagandaScore": 5,
            "category": "Politics",
            "explanation": "   "
        }"#;
        assert!(matches!(
            Verdict::from_model_output(raw),
            Err(VerdictError::Invalid(_))
        ));
    }

    #[test]
    fn test_serializes_with_wire_keys() {
        let verdict = Verdict {
            label: VerdictLabel::Satire,
            truth_score: 10,
            propaganda_score: 20,
            category: "Social".to_string(),
            explanation: "Published by a satire page.".to_string(),
            image_keywords: None,
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "Satire");
        assert_eq!(json["truthScore"], 10);
        assert!(json.get("imageKeywords").is_none());
    }

    #[test]
    fn test_label_from_str() {
        assert_eq!("Unverified".parse::<VerdictLabel>().unwrap(), VerdictLabel::Unverified);
        assert!("Global".parse::<VerdictLabel>().is_err());
        assert!("real".parse::<VerdictLabel>().is_err());
    }

    proptest! {
        #[test]
        fn prop_accepted_scores_are_in_range(truth in 0i64..300, propaganda in -50i64..300) {
            let raw = serde_json::json!({
                "verdict": "Unverified",
                "truthScore": truth,
                "propagandaScore": propaganda,
                "category": "World News",
                "explanation": "No trusted coverage."
            })
            .to_string();

            match Verdict::from_model_output(&raw) {
                Ok(v) => {
                    prop_assert!(v.truth_score <= MAX_SCORE);
                    prop_assert!(v.propaganda_score <= MAX_SCORE);
                }
                Err(_) => prop_assert!(truth > 100 || !(0..=100).contains(&propaganda)),
            }
        }
    }
}
