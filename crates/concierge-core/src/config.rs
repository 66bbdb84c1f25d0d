//! Orchestrator tuning knobs.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! max_completion_attempts = 3
//! max_steps_per_turn = 8
//! exit_commands = ["quit", "exit", "bye"]
//! unavailable_message = "Please try again in a moment."
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use concierge_contracts::error::{ConciergeError, ConciergeResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// How many times one completion call is attempted before the turn is
    /// abandoned as unavailable.
    pub max_completion_attempts: u32,
    /// Upper bound on completion calls within one user turn, covering
    /// re-prompts, tool round-trips and handoff acknowledgements.
    pub max_steps_per_turn: u32,
    /// Inputs that close the session, compared case-insensitively.
    pub exit_commands: Vec<String>,
    /// Shown when no usable completion could be obtained.
    pub unavailable_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_completion_attempts: 3,
            max_steps_per_turn: 8,
            exit_commands: vec!["quit".to_string(), "exit".to_string()],
            unavailable_message: "We could not complete your request right now. Please try again."
                .to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_toml_str(s: &str) -> ConciergeResult<Self> {
        toml::from_str(s).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to parse orchestrator TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> ConciergeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to read orchestrator config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Return true if `input` is one of the configured exit commands.
    pub fn is_exit_command(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_commands.iter().any(|c| c.eq_ignore_ascii_case(input))
    }
}
