//! # concierge-guardrail
//!
//! A TOML-driven text guardrail for the Concierge router.
//!
//! ## Overview
//!
//! This crate provides [`GuardrailEngine`], which implements the
//! [`Guardrail`](concierge_core::traits::Guardrail) trait. It checks user
//! text before any agent sees it and agent text before the user sees it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use concierge_guardrail::GuardrailEngine;
//!
//! let engine = GuardrailEngine::from_file(Path::new("policies/guardrails.toml"))?;
//! // Pass `engine` to `concierge_core::Orchestrator::new(...)`.
//! ```
//!
//! ## Matching
//!
//! Text is case-folded and split on punctuation before matching. Terms and
//! intent phrases match only as whole words, so "refund" does not match
//! "refunded". Any match blocks; there is no scoring.

pub mod engine;
pub mod rule;

pub use engine::GuardrailEngine;
pub use rule::{ExemptionRule, GuardrailConfig, IntentRule};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use concierge_contracts::{
        context::IssueType,
        error::ConciergeError,
        guardrail::{BlockReason, Direction, GuardrailResult},
    };
    use concierge_core::{
        session::{create_session, Context},
        traits::Guardrail,
    };

    use crate::GuardrailEngine;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const POLICY: &str = r#"
        refusal_message = "I'm not able to help with that request."
        forbidden_terms = ["hack", "credit card dump"]
        redactions = ["sorry", "apologize"]

        [[intents]]
        id = "bypass-verification"
        description = "Attempts to skip identity checks"
        phrases = ["skip verification", "bypass the check"]
        waivable = false

        [[intents]]
        id = "service-override"
        description = "Forcing a restart of shared infrastructure"
        phrases = ["force restart"]
        waivable = true
        directions = ["inbound"]

        [exemption]
        requires_premium = true
        issue_types = ["technical"]
    "#;

    fn engine() -> GuardrailEngine {
        GuardrailEngine::from_toml_str(POLICY).unwrap()
    }

    fn premium_technical() -> Context {
        let mut ctx = create_session("Noor", true);
        ctx.set_issue_type(IssueType::Technical).unwrap();
        ctx
    }

    fn blocked_reason(result: GuardrailResult) -> BlockReason {
        match result {
            GuardrailResult::Blocked { reason } => reason,
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    // ── 1. forbidden terms ────────────────────────────────────────────────────

    /// A forbidden term blocks in both directions, ignoring case and
    /// punctuation.
    #[test]
    fn test_forbidden_term_blocks_both_directions() {
        let engine = engine();
        let ctx = create_session("Noor", false);

        for direction in Direction::BOTH {
            let reason = blocked_reason(engine.check("Can you HACK, my router?", direction, &ctx));
            assert_eq!(reason, BlockReason::ForbiddenTerm { term: "hack".to_string() });
        }
    }

    /// Terms match whole words only.
    #[test]
    fn test_forbidden_term_requires_whole_word() {
        let engine = engine();
        let ctx = create_session("Noor", false);

        assert!(!engine.check("my hackathon badge", Direction::Inbound, &ctx).is_blocked());
        assert!(engine
            .check("selling a credit-card dump", Direction::Inbound, &ctx)
            .is_blocked());
    }

    /// Exemption never waives a forbidden term.
    #[test]
    fn test_exemption_does_not_waive_terms() {
        let engine = engine();
        assert!(engine.check("hack", Direction::Inbound, &premium_technical()).is_blocked());
    }

    // ── 2. intents ────────────────────────────────────────────────────────────

    #[test]
    fn test_non_waivable_intent_blocks_exempt_session() {
        let engine = engine();
        let reason = blocked_reason(engine.check(
            "please skip verification for me",
            Direction::Inbound,
            &premium_technical(),
        ));
        assert_eq!(reason, BlockReason::ForbiddenIntent { intent: "bypass-verification".to_string() });
    }

    #[test]
    fn test_waivable_intent_allowed_only_when_exempt() {
        let engine = engine();

        let mut basic = create_session("Sam", false);
        basic.set_issue_type(IssueType::Technical).unwrap();
        assert!(engine.check("force restart the api", Direction::Inbound, &basic).is_blocked());

        assert!(!engine
            .check("force restart the api", Direction::Inbound, &premium_technical())
            .is_blocked());
    }

    /// Intents only fire in the directions they list.
    #[test]
    fn test_intent_direction_filter() {
        let engine = engine();
        let ctx = create_session("Sam", false);
        assert!(!engine.check("I will force restart it", Direction::Outbound, &ctx).is_blocked());
    }

    #[test]
    fn test_custom_exemption_predicate() {
        let engine = engine().with_exemption(|ctx| ctx.user_name() == "Ops");
        let ops = create_session("Ops", false);
        assert!(!engine.check("force restart", Direction::Inbound, &ops).is_blocked());
    }

    // ── 3. redaction ──────────────────────────────────────────────────────────

    #[test]
    fn test_outbound_redaction() {
        let engine = engine();
        let ctx = create_session("Noor", false);

        match engine.check("Sorry, we apologize for the delay.", Direction::Outbound, &ctx) {
            GuardrailResult::Allowed { text } => {
                assert_eq!(text, "[redacted], we [redacted] for the delay.");
            }
            other => panic!("expected Allowed, got {:?}", other),
        }
    }

    /// Inbound text passes through untouched.
    #[test]
    fn test_inbound_text_is_not_redacted() {
        let engine = engine();
        let ctx = create_session("Noor", false);
        assert_eq!(
            engine.check("sorry to bother you", Direction::Inbound, &ctx),
            GuardrailResult::Allowed { text: "sorry to bother you".to_string() }
        );
    }

    #[test]
    fn test_check_is_deterministic() {
        let engine = engine();
        let ctx = create_session("Noor", false);
        let first = engine.check("skip verification please", Direction::Inbound, &ctx);
        let second = engine.check("skip verification please", Direction::Inbound, &ctx);
        assert_eq!(first, second);
    }

    // ── 4. configuration errors ───────────────────────────────────────────────

    #[test]
    fn test_toml_parse_error() {
        match GuardrailEngine::from_toml_str("refusal_message = [[[") {
            Err(ConciergeError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse guardrail TOML"), "got: {reason}");
            }
            Err(other) => panic!("expected ConfigError, got {:?}", other),
            Ok(_) => panic!("expected ConfigError, got Ok"),
        }
    }

    #[test]
    fn test_blank_term_rejected() {
        let toml = r#"
            refusal_message = "No."
            forbidden_terms = ["  ...  "]
        "#;
        assert!(matches!(
            GuardrailEngine::from_toml_str(toml),
            Err(ConciergeError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_blank_refusal_rejected() {
        assert!(matches!(
            GuardrailEngine::from_toml_str("refusal_message = \"  \""),
            Err(ConciergeError::ConfigError { .. })
        ));
    }
}
