//! Model verdicts and their validation.
//!
//! Verdicts arrive as untrusted JSON. This module validates them against an
//! embedded JSON Schema and then deserializes them into typed values.

mod parser;
mod schema;

pub use parser::{Verdict, VerdictError, VerdictLabel, MAX_SCORE};
pub use schema::{is_valid_verdict, validate_verdict_schema, SchemaError};
