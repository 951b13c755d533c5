//! Persisted verification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::types::{Claim, Scope};
use crate::verdict::{Verdict, VerdictLabel};

/// A claim merged with its verdict and bookkeeping.
///
/// `title` is unique across every persisted record: a claim is verified at
/// most once. Records are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedRecord {
    pub title: String,
    pub url: String,
    pub source_label: String,
    pub scope: Scope,
    #[serde(rename = "verdict")]
    pub label: VerdictLabel,
    pub truth_score: u8,
    pub propaganda_score: u8,
    pub category: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_keywords: Option<String>,
    /// Rendered evidence the verdict was based on
    pub evidence: String,
    pub created_at: DateTime<Utc>,
}

impl VerifiedRecord {
    /// Merge a claim with its verdict.
    pub fn assemble(
        claim: Claim,
        verdict: Verdict,
        scope: Scope,
        evidence: &Evidence,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: claim.title,
            url: claim.url,
            source_label: claim.source_label,
            scope,
            label: verdict.label,
            truth_score: verdict.truth_score,
            propaganda_score: verdict.propaganda_score,
            category: verdict.category,
            explanation: verdict.explanation,
            image_keywords: verdict.image_keywords,
            evidence: evidence.render(),
            created_at,
        }
    }

    /// The verdict portion of the record.
    pub fn verdict(&self) -> Verdict {
        Verdict {
            label: self.label,
            truth_score: self.truth_score,
            propaganda_score: self.propaganda_score,
            category: self.category.clone(),
            explanation: self.explanation.clone(),
            image_keywords: self.image_keywords.clone(),
        }
    }
}
