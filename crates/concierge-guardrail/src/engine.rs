//! `GuardrailEngine`: the `Guardrail` implementation driven by a TOML policy.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use concierge_contracts::{
    error::{ConciergeError, ConciergeResult},
    guardrail::{BlockReason, Direction, GuardrailResult},
};
use concierge_core::{session::Context, traits::Guardrail};

use crate::rule::{contains_words, normalize, ExemptionRule, GuardrailConfig, IntentRule};

const REDACTED: &str = "[redacted]";

type ExemptionFn = Box<dyn Fn(&Context) -> bool + Send + Sync>;

/// A deterministic text guardrail loaded from TOML.
///
/// Checks run in a fixed order and the first match blocks:
///
/// 1. Forbidden terms, in declaration order, regardless of direction or
///    exemption.
/// 2. Intents that apply to the direction, in declaration order. Waivable
///    intents are skipped when the session is exempt.
///
/// Allowed outbound text then has every configured redaction applied.
pub struct GuardrailEngine {
    refusal_message: String,
    terms: Vec<(String, Vec<String>)>,
    intents: Vec<CompiledIntent>,
    redactions: Vec<Regex>,
    exemption: ExemptionFn,
}

struct CompiledIntent {
    rule: IntentRule,
    phrases: Vec<Vec<String>>,
}

impl CompiledIntent {
    fn matches(&self, words: &[String]) -> bool {
        self.phrases.iter().any(|phrase| contains_words(words, phrase))
    }
}

impl GuardrailEngine {
    /// Build an engine from an already-parsed config.
    ///
    /// Fails with `ConfigError` if the refusal message is blank, a term or
    /// phrase normalizes to nothing, or a redaction cannot be compiled.
    pub fn from_config(config: GuardrailConfig) -> ConciergeResult<Self> {
        if config.refusal_message.trim().is_empty() {
            return Err(ConciergeError::ConfigError {
                reason: "guardrail refusal_message must not be empty".to_string(),
            });
        }

        let terms = config
            .forbidden_terms
            .into_iter()
            .map(|term| -> ConciergeResult<_> {
                let words = non_empty_words(&term, "forbidden term")?;
                Ok((term, words))
            })
            .collect::<ConciergeResult<Vec<_>>>()?;

        let intents = config
            .intents
            .into_iter()
            .map(|rule| -> ConciergeResult<_> {
                let phrases = rule
                    .phrases
                    .iter()
                    .map(|p| non_empty_words(p, &format!("phrase of intent '{}'", rule.id)))
                    .collect::<ConciergeResult<Vec<_>>>()?;
                Ok(CompiledIntent { rule, phrases })
            })
            .collect::<ConciergeResult<Vec<_>>>()?;

        let redactions = config
            .redactions
            .iter()
            .map(|phrase| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase.trim()))).map_err(|e| {
                    ConciergeError::ConfigError {
                        reason: format!("invalid redaction '{phrase}': {e}"),
                    }
                })
            })
            .collect::<ConciergeResult<Vec<_>>>()?;

        let exemption = config.exemption;
        debug!(
            terms = terms.len(),
            intents = intents.len(),
            redactions = redactions.len(),
            exemption = exemption.is_some(),
            "guardrail engine loaded"
        );

        Ok(Self {
            refusal_message: config.refusal_message,
            terms,
            intents,
            redactions,
            exemption: exemption_from_rule(exemption),
        })
    }

    /// Parse `s` as TOML and build the engine.
    pub fn from_toml_str(s: &str) -> ConciergeResult<Self> {
        let config: GuardrailConfig = toml::from_str(s).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to parse guardrail TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as guardrail configuration.
    pub fn from_file(path: &Path) -> ConciergeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to read guardrail file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Replace the configured exemption rule with an arbitrary predicate.
    pub fn with_exemption(mut self, exemption: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
        self.exemption = Box::new(exemption);
        self
    }

    fn redact(&self, text: &str) -> String {
        self.redactions
            .iter()
            .fold(text.to_string(), |acc, re| re.replace_all(&acc, REDACTED).into_owned())
    }
}

impl Guardrail for GuardrailEngine {
    fn check(&self, text: &str, direction: Direction, context: &Context) -> GuardrailResult {
        let words = normalize(text);

        if let Some((term, _)) = self.terms.iter().find(|(_, w)| contains_words(&words, w)) {
            return GuardrailResult::Blocked {
                reason: BlockReason::ForbiddenTerm { term: term.clone() },
            };
        }

        let mut exempt = None;
        for intent in self.intents.iter().filter(|i| i.rule.applies_to(direction)) {
            if !intent.matches(&words) {
                continue;
            }
            if intent.rule.waivable && *exempt.get_or_insert_with(|| (self.exemption)(context)) {
                debug!(
                    session_id = %context.session_id(),
                    intent = %intent.rule.id,
                    direction = %direction,
                    "waivable intent allowed for exempt session"
                );
                continue;
            }
            return GuardrailResult::Blocked {
                reason: BlockReason::ForbiddenIntent { intent: intent.rule.id.clone() },
            };
        }

        let text = match direction {
            Direction::Inbound => text.to_string(),
            Direction::Outbound => self.redact(text),
        };
        GuardrailResult::Allowed { text }
    }

    fn refusal_message(&self) -> &str {
        &self.refusal_message
    }
}

fn non_empty_words(text: &str, what: &str) -> ConciergeResult<Vec<String>> {
    let words = normalize(text);
    if words.is_empty() {
        return Err(ConciergeError::ConfigError {
            reason: format!("{what} '{text}' contains no words"),
        });
    }
    Ok(words)
}

fn exemption_from_rule(rule: Option<ExemptionRule>) -> ExemptionFn {
    match rule {
        Some(rule) => Box::new(move |ctx: &Context| rule.holds(ctx.is_premium(), ctx.issue_type())),
        None => Box::new(|_: &Context| false),
    }
}
