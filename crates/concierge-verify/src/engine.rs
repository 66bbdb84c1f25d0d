//! Schema-based tool argument verifier.
//!
//! `ArgsVerifier` implements the `Verifier` trait from `concierge-core`.
//! Verification runs in two phases:
//!
//! 1. **Structural**: the invocation's `args` are validated against the
//!    tool's `args_schema` using the `jsonschema` crate.
//! 2. **Custom**: every check registered for the tool runs in registration
//!    order. All failures are collected before returning.
//!
//! Domain rules such as "refund needs a ticket id that looks like one" live
//! in the hosting application and are registered with `register_check`.

use std::collections::HashMap;

use tracing::{debug, warn};

use concierge_contracts::{
    error::{ConciergeError, ConciergeResult},
    tool::{ToolId, ToolInvocationRequest, ToolSpec},
    verify::{VerificationFailure, VerificationReport},
};
use concierge_core::traits::Verifier;

/// A caller-supplied argument check.
///
/// Receives the invocation's `args`. Returns `Some(message)` when the check
/// fails, or `None` on success.
pub type CheckFn = Box<dyn Fn(&serde_json::Value) -> Option<String> + Send + Sync>;

struct NamedCheck {
    check_id: String,
    check: CheckFn,
}

/// The tool argument verifier.
#[derive(Default)]
pub struct ArgsVerifier {
    checks: HashMap<ToolId, Vec<NamedCheck>>,
}

impl ArgsVerifier {
    /// Create a verifier with no custom checks registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom check for `tool` under `check_id`.
    ///
    /// Checks for the same tool run in registration order.
    pub fn register_check(&mut self, tool: ToolId, check_id: impl Into<String>, check: CheckFn) {
        self.checks.entry(tool).or_default().push(NamedCheck {
            check_id: check_id.into(),
            check,
        });
    }

    /// Builder form of [`register_check`](Self::register_check).
    pub fn with_check(mut self, tool: &str, check_id: impl Into<String>, check: CheckFn) -> Self {
        self.register_check(ToolId::new(tool), check_id, check);
        self
    }
}

impl Verifier for ArgsVerifier {
    /// Verify `invocation` against `spec`.
    ///
    /// A null `args_schema` means no structural constraint. A schema that
    /// does not compile is reported as `SchemaValidation`.
    fn verify(
        &self,
        invocation: &ToolInvocationRequest,
        spec: &ToolSpec,
    ) -> ConciergeResult<VerificationReport> {
        let mut failures: Vec<VerificationFailure> = Vec::new();
        let args = &invocation.args;

        // ── Phase 1: JSON Schema ──────────────────────────────────────────────
        if !spec.args_schema.is_null() {
            let validator = jsonschema::validator_for(&spec.args_schema).map_err(|e| {
                ConciergeError::SchemaValidation {
                    reason: format!("args schema for tool '{}' does not compile: {e}", spec.id),
                }
            })?;
            for error in validator.iter_errors(args) {
                let message = format!("argument violation at '{}': {}", error.instance_path, error);
                warn!(tool = %spec.id, %message, "tool arguments failed schema validation");
                failures.push(VerificationFailure {
                    check_id: "json-schema".to_string(),
                    message,
                });
            }
        }

        // ── Phase 2: Custom checks ────────────────────────────────────────────
        for named in self.checks.get(&invocation.tool).into_iter().flatten() {
            debug!(tool = %invocation.tool, check_id = %named.check_id, "running argument check");
            if let Some(message) = (named.check)(args) {
                warn!(tool = %invocation.tool, check_id = %named.check_id, %message, "argument check failed");
                failures.push(VerificationFailure {
                    check_id: named.check_id.clone(),
                    message,
                });
            }
        }

        Ok(VerificationReport::from_failures(failures))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use concierge_contracts::{
        error::ConciergeError,
        tool::{ToolEligibility, ToolId, ToolInvocationRequest, ToolSpec},
    };
    use concierge_core::traits::Verifier;

    use super::ArgsVerifier;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn refund_spec() -> ToolSpec {
        ToolSpec {
            id: ToolId::new("refund"),
            description: "Refund a ticket".to_string(),
            args_schema: json!({
                "type": "object",
                "required": ["ticket_id"],
                "properties": {
                    "ticket_id": { "type": "string", "minLength": 1 },
                    "amount": { "type": "number", "minimum": 0 }
                }
            }),
            eligibility: ToolEligibility::default(),
        }
    }

    fn call(tool: &str, args: serde_json::Value) -> ToolInvocationRequest {
        ToolInvocationRequest { tool: ToolId::new(tool), args }
    }

    // ── 1. schema pass ────────────────────────────────────────────────────────

    #[test]
    fn test_schema_pass() {
        let verifier = ArgsVerifier::new();
        let report = verifier
            .verify(&call("refund", json!({ "ticket_id": "t-1", "amount": 10 })), &refund_spec())
            .unwrap();
        assert!(report.passed, "unexpected failures: {:?}", report.failures);
    }

    // ── 2. schema fail ────────────────────────────────────────────────────────

    /// Every violation is reported, not only the first.
    #[test]
    fn test_schema_fail_collects_all_violations() {
        let verifier = ArgsVerifier::new();
        let report = verifier
            .verify(&call("refund", json!({ "amount": -5 })), &refund_spec())
            .unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures.len(), 2, "failures: {:?}", report.failures);
        assert!(report.failures.iter().all(|f| f.check_id == "json-schema"));
    }

    // ── 3. null schema ────────────────────────────────────────────────────────

    #[test]
    fn test_null_schema_skips_structural_check() {
        let spec = ToolSpec { args_schema: serde_json::Value::Null, ..refund_spec() };
        let report = ArgsVerifier::new().verify(&call("refund", json!("anything")), &spec).unwrap();
        assert!(report.passed);
    }

    // ── 4. custom checks ──────────────────────────────────────────────────────

    #[test]
    fn test_custom_check_fail() {
        let verifier = ArgsVerifier::new().with_check(
            "refund",
            "ticket-format",
            Box::new(|args: &serde_json::Value| {
                let id = args["ticket_id"].as_str().unwrap_or_default();
                (!id.starts_with("TCK-")).then(|| format!("ticket id '{id}' is malformed"))
            }),
        );

        let report = verifier
            .verify(&call("refund", json!({ "ticket_id": "abc" })), &refund_spec())
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].check_id, "ticket-format");
        assert!(report.summary().contains("malformed"));

        let report = verifier
            .verify(&call("refund", json!({ "ticket_id": "TCK-1" })), &refund_spec())
            .unwrap();
        assert!(report.passed);
    }

    /// Checks registered for one tool never run for another.
    #[test]
    fn test_custom_check_scoped_to_tool() {
        let verifier = ArgsVerifier::new().with_check(
            "restart_service",
            "always-fails",
            Box::new(|_: &serde_json::Value| Some("nope".to_string())),
        );
        let report = verifier
            .verify(&call("refund", json!({ "ticket_id": "t-1" })), &refund_spec())
            .unwrap();
        assert!(report.passed);
    }

    // ── 5. invalid schema ─────────────────────────────────────────────────────

    #[test]
    fn test_uncompilable_schema_is_error() {
        let spec = ToolSpec { args_schema: json!({ "type": 12 }), ..refund_spec() };
        match ArgsVerifier::new().verify(&call("refund", json!({})), &spec) {
            Err(ConciergeError::SchemaValidation { reason }) => assert!(reason.contains("refund")),
            other => panic!("expected SchemaValidation, got {:?}", other),
        }
    }
}
