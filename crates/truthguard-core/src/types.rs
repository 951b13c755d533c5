//! Shared domain types: scopes and claims.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label attached to claims served from the built-in fallback data set.
pub const EMERGENCY_SOURCE_LABEL: &str = "Emergency Snapshot";

/// Error returned when a scope name is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown scope '{0}': expected 'local' or 'global'")]
pub struct ScopeParseError(pub String);

/// Partition distinguishing regional from international pipelines.
///
/// The scope decides which feeds are read, which trusted outlets are
/// searched, which system prompt is used, and which endpoint surfaces the
/// resulting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Global,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Local, Scope::Global];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Global => "global",
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Scope::Local),
            "global" => Ok(Scope::Global),
            other => Err(ScopeParseError(other.to_string())),
        }
    }
}

/// A candidate statement pulled from an untrusted feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// The claim text; natural key for deduplication
    pub title: String,

    /// Link to the originating post
    pub url: String,

    /// Which feed produced the claim
    #[serde(default)]
    pub source_label: String,
}

impl Claim {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_label: source_label.into(),
        }
    }

    /// Shortened title for log lines.
    pub fn preview(&self) -> String {
        const PREVIEW_CHARS: usize = 40;
        if self.title.chars().count() <= PREVIEW_CHARS {
            return self.title.clone();
        }
        let head: String = self.title.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}

/// Whether a feed item qualifies as a claim.
///
/// Pinned posts are moderator notices, and titles at or below `min_title_len`
/// characters are too short to verify.
pub fn is_eligible_title(title: &str, pinned: bool, min_title_len: usize) -> bool {
    !pinned && title.trim().chars().count() > min_title_len
}
