//! Evidence gathered from trusted outlets.
//!
//! Evidence is either a compact list of `[source] headline` pairs or one of
//! three sentinels that let the pipeline continue without an error when no
//! usable search result exists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between rendered articles.
pub const EVIDENCE_DELIMITER: &str = " | ";

/// A single article returned by the trusted-domain search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceArticle {
    /// Publishing outlet, e.g. "Reuters"
    pub source_name: String,

    /// Article headline
    pub headline: String,
}

impl EvidenceArticle {
    pub fn new(source_name: impl Into<String>, headline: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            headline: headline.into(),
        }
    }
}

impl fmt::Display for EvidenceArticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source_name, self.headline)
    }
}

/// Outcome of an evidence lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// Matching articles, in the search API's relevance order
    Found(Vec<EvidenceArticle>),

    /// No search credential is configured; no call was made
    MissingCredential,

    /// The search succeeded but returned no qualifying article
    NoMatch,

    /// The search failed (network, auth, quota, malformed body)
    SearchUnavailable,
}

impl Evidence {
    pub const MISSING_CREDENTIAL: &'static str = "missing-credential";
    pub const NO_MATCH: &'static str = "no-match";
    pub const SEARCH_UNAVAILABLE: &'static str = "search-unavailable";

    /// Build evidence from search results; an empty list is `NoMatch`.
    pub fn from_articles(articles: Vec<EvidenceArticle>) -> Self {
        if articles.is_empty() {
            Evidence::NoMatch
        } else {
            Evidence::Found(articles)
        }
    }

    /// Whether this is one of the sentinel states.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Evidence::Found(_))
    }

    /// Render evidence as the text handed to the model and stored on the record.
    pub fn render(&self) -> String {
        match self {
            Evidence::Found(articles) => articles
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(EVIDENCE_DELIMITER),
            Evidence::MissingCredential => Self::MISSING_CREDENTIAL.to_string(),
            Evidence::NoMatch => Self::NO_MATCH.to_string(),
            Evidence::SearchUnavailable => Self::SEARCH_UNAVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
