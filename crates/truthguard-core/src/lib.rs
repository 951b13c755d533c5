//! # truthguard-core
//!
//! Domain model for the TruthGuard claim-verification pipeline.
//!
//! This crate holds everything about a claim that can be decided without
//! touching the network:
//! - What a claim, a scope and a persisted record look like
//! - Which feed items qualify as claims
//! - How a claim is reduced to a search query
//! - How evidence is rendered, including the sentinel states
//! - Whether a model verdict is acceptable (JSON Schema + invariants)
//!
//! ## Key Guarantees
//!
//! 1. **No I/O**: all network, model and storage access lives in
//!    `truthguard-runtime`
//! 2. **Validated verdicts**: malformed model output never becomes a
//!    `Verdict`; scores are always within `0..=100`
//! 3. **One label set**: `VerdictLabel` is closed; topic tags stay in
//!    `category` and the regional partition stays in `Scope`
//!
//! ## Example
//!
//! ```rust
//! use truthguard_core::{search_query, Verdict, VerdictLabel};
//!
//! let query = search_query("BREAKING: Fuel prices cut by 10% from Sunday!", 6);
//! assert_eq!(query, "BREAKING Fuel prices cut by 10");
//!
//! let verdict = Verdict::from_model_output(r#"{
//!     "verdict": "Unverified",
//!     "truthScore": 40,
//!     "propagandaScore": 20,
//!     "category": "Economy",
//!     "explanation": "No trusted outlet reports the cut."
//! }"#).unwrap();
//! assert_eq!(verdict.label, VerdictLabel::Unverified);
//! ```

pub mod evidence;
pub mod patterns;
pub mod record;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use evidence::{Evidence, EvidenceArticle, EVIDENCE_DELIMITER};
pub use patterns::{search_query, strip_punctuation, DEFAULT_QUERY_WORDS};
pub use record::VerifiedRecord;
pub use types::{is_eligible_title, Claim, Scope, ScopeParseError, EMERGENCY_SOURCE_LABEL};
pub use verdict::{Verdict, VerdictError, VerdictLabel, MAX_SCORE};
