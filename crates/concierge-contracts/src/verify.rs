//! Tool argument verification report types.
//!
//! Before a granted tool runs, the verifier checks the invocation's
//! arguments against the tool's JSON Schema and any registered custom
//! checks. Only a passing `VerificationReport` lets the tool execute.

use serde::{Deserialize, Serialize};

/// The result of verifying one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if every check passed.
    pub passed: bool,
    /// All failures collected during this run. Empty on pass.
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn pass() -> Self {
        Self { passed: true, failures: Vec::new() }
    }

    pub fn from_failures(failures: Vec<VerificationFailure>) -> Self {
        Self { passed: failures.is_empty(), failures }
    }

    /// One-line summary of all failures, `"[check] message; ..."`.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.check_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// `"json-schema"` for structural failures, otherwise the custom check name.
    pub check_id: String,
    pub message: String,
}
