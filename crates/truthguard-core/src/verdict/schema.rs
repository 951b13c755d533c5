//! JSON Schema validation for model verdicts.
//!
//! Every verdict returned by the language model is checked against
//! `schema/verdict.schema.json` before it is deserialized. Shape is never
//! trusted: a payload that is missing a field or carries an out-of-range
//! score is rejected here.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded verdict schema (loaded at compile time).
const VERDICT_SCHEMA_JSON: &str = include_str!("../../schema/verdict.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(VERDICT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => {
            tracing::error!(error = %e, "Verdict schema unavailable");
            Err(SchemaError::LoadError(e.clone()))
        }
    }
}

/// Validate a verdict JSON value against the schema.
///
/// Returns `Ok(())` if valid, or every violation as `"<error> at <path>"`.
pub fn validate_verdict_schema(verdict_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(verdict_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check if a verdict JSON value is valid against the schema.
pub fn is_valid_verdict(verdict_json: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(verdict_json))
        .unwrap_or(false)
}
