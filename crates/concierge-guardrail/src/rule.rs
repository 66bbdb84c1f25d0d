//! Guardrail rule types and configuration schema.
//!
//! A `GuardrailConfig` is deserialized from TOML. Terms and phrases are
//! written in plain words; matching happens on normalized text, so case and
//! punctuation in either the rule or the checked text do not matter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use concierge_contracts::{context::IssueType, guardrail::Direction};

/// The top-level structure deserialized from a guardrails TOML file.
///
/// Example:
/// ```toml
/// refusal_message = "I'm not able to help with that request."
/// forbidden_terms = ["password dump"]
/// redactions = ["sorry", "apologize"]
///
/// [[intents]]
/// id = "account-takeover"
/// description = "Requests to access someone else's account"
/// phrases = ["log into my friend's account"]
/// waivable = false
///
/// [exemption]
/// requires_premium = true
/// issue_types = ["technical"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Shown in place of any blocked text. Never reveals what matched.
    pub refusal_message: String,

    /// Whole-word terms that block text in both directions, for every
    /// session. Exemptions never apply to these.
    #[serde(default)]
    pub forbidden_terms: Vec<String>,

    #[serde(default)]
    pub intents: Vec<IntentRule>,

    /// Phrases replaced by `[redacted]` in outbound text that was allowed.
    #[serde(default)]
    pub redactions: Vec<String>,

    /// Sessions for which waivable intents are allowed. Absent means no
    /// session is exempt.
    #[serde(default)]
    pub exemption: Option<ExemptionRule>,
}

/// A forbidden intent, detected by phrase heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    /// Stable identifier used in block reasons and audit records.
    pub id: String,

    pub description: String,

    /// Any one phrase appearing as a run of whole words triggers the intent.
    pub phrases: Vec<String>,

    /// When true, sessions matching the exemption rule may pass.
    #[serde(default)]
    pub waivable: bool,

    #[serde(default = "default_directions")]
    pub directions: BTreeSet<Direction>,
}

fn default_directions() -> BTreeSet<Direction> {
    Direction::BOTH.into_iter().collect()
}

impl IntentRule {
    pub fn applies_to(&self, direction: Direction) -> bool {
        self.directions.contains(&direction)
    }
}

/// Which sessions are exempt from waivable intents.
///
/// Both conditions must hold. An empty `issue_types` set accepts any issue
/// type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionRule {
    #[serde(default)]
    pub requires_premium: bool,
    #[serde(default)]
    pub issue_types: BTreeSet<IssueType>,
}

impl ExemptionRule {
    pub fn holds(&self, is_premium: bool, issue_type: IssueType) -> bool {
        (!self.requires_premium || is_premium)
            && (self.issue_types.is_empty() || self.issue_types.contains(&issue_type))
    }
}

/// Case-fold `text` and split it into words, treating punctuation as a
/// separator.
pub fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return true if `needle` occurs in `haystack` as a contiguous run of words.
pub fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}
