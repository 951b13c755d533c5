//! System prompts for verdict and chat requests.
//!
//! Prompts are assembled from three parts:
//! 1. Base prompt (shared by both scopes): output contract and scoring rules
//! 2. Scope prompt: which outlets count as trusted and the topic vocabulary
//! 3. Dynamic content: the claim and its rendered evidence

use truthguard_core::{Claim, Evidence, Scope};

use crate::providers::ChatMessage;

/// Base system prompt shared by both scopes.
///
/// The label list and field names must stay in step with the verdict schema.
pub const BASE_SYSTEM_PROMPT: &str = r#"
You are a news verification analyst. Output JSON only.

You receive one CLAIM taken from an unverified social feed and the EVIDENCE
found for it among trusted outlets. Judge the claim against the evidence.

## Evidence States
- A list of "[Outlet] headline" entries separated by " | "
- "no-match": trusted outlets have not reported this
- "search-unavailable" or "missing-credential": no evidence could be gathered

Absence of coverage is not proof of falsehood. Without supporting evidence
prefer "Unverified" over "Fake" unless the claim is implausible on its face.

## Output Format (JSON)
{
  "verdict": "Real" | "Fake" | "Misleading" | "Unverified" | "Satire",
  "truthScore": 0-100,
  "propagandaScore": 0-100,
  "category": "short topic tag",
  "explanation": "one or two sentences",
  "imageKeywords": "two or three search words for an illustration"
}

## Scores
- truthScore: how well the evidence supports the claim (100 = fully confirmed)
- propagandaScore: emotional manipulation, loaded language, partisan framing
"#;

/// Scope prompt for Nepali domestic claims.
pub const LOCAL_SCOPE_PROMPT: &str = r#"
## Scope: Nepal
Claims concern Nepali politics, economy and society. Trusted outlets are
established Nepali newspapers and portals plus Reuters. Claims may be written
in English, Nepali or a mix of both.
Use categories such as Politics, Economy, Social, Health, Disaster, Sports.
"#;

/// Scope prompt for international claims.
pub const GLOBAL_SCOPE_PROMPT: &str = r#"
## Scope: International
Claims concern world affairs. Trusted outlets are international wire
services and public broadcasters.
Use categories such as World News, Conflict, Economy, Science, Health, Climate.
"#;

/// System prompt for the chat assistant.
pub const CHAT_SYSTEM_PROMPT: &str = r#"
You are TruthGuard Nepal, an assistant that helps readers judge news and
spot misinformation. Answer briefly and plainly.
Output JSON only, in the form {"explanation": "your reply"}.
"#;

/// Get the scope prompt for a scope.
pub fn get_scope_prompt(scope: Scope) -> &'static str {
    match scope {
        Scope::Local => LOCAL_SCOPE_PROMPT,
        Scope::Global => GLOBAL_SCOPE_PROMPT,
    }
}

/// Full system prompt for verdicts in a scope.
pub fn verdict_system_prompt(scope: Scope) -> String {
    format!("{}{}", BASE_SYSTEM_PROMPT.trim_end(), get_scope_prompt(scope))
}

/// Messages asking for a verdict on one claim.
pub fn verdict_messages(claim: &Claim, evidence: &Evidence, scope: Scope) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(verdict_system_prompt(scope)),
        ChatMessage::user(format!(
            "ANALYZE CLAIM: \"{}\"\nEVIDENCE: \"{}\"",
            claim.title,
            evidence.render()
        )),
    ]
}

/// Messages for a free-form chat turn.
pub fn chat_messages(message: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CHAT_SYSTEM_PROMPT.trim()),
        ChatMessage::user(message),
    ]
}
