//! The static agent registry and tool catalog.
//!
//! `AgentRegistry` is built once at process start from a TOML document and
//! is read-only afterwards, so it can be shared between sessions behind an
//! `Arc` without locking.
//!
//! Loading validates the routing topology:
//!
//! 1. Agent and tool ids are unique.
//! 2. Triage is registered and hands off to exactly Billing, Technical and
//!    General, all of which must be registered.
//! 3. Specialists hand off to nothing but Triage (no lateral routing).
//! 4. Every tool an agent lists exists in the catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use concierge_contracts::{
    agent::{AgentDefinition, AgentId},
    error::{ConciergeError, ConciergeResult},
    tool::{ToolId, ToolSpec},
};

/// The top-level structure deserialized from an agents TOML file.
///
/// Example:
/// ```toml
/// [[tools]]
/// id = "refund"
/// description = "Refund a ticket"
/// eligibility = { requires_premium = true, issue_types = ["billing"] }
///
/// [[agents]]
/// id = "billing"
/// role_prompt = "You handle billing questions."
/// allowed_tools = ["refund"]
/// handoff_targets = ["triage"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,
}

/// Validated, immutable lookup of agent definitions and tool specs.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, AgentDefinition>,
    tools: BTreeMap<ToolId, ToolSpec>,
}

impl AgentRegistry {
    /// Validate `config` and build the registry.
    ///
    /// Returns `UnknownAgent` when a required or referenced agent is missing
    /// and `ConfigError` for every other topology violation.
    pub fn from_config(config: RegistryConfig) -> ConciergeResult<Self> {
        let mut tools = BTreeMap::new();
        for spec in config.tools {
            if tools.contains_key(&spec.id) {
                return Err(ConciergeError::ConfigError {
                    reason: format!("tool '{}' is declared more than once", spec.id),
                });
            }
            tools.insert(spec.id.clone(), spec);
        }

        let mut agents = BTreeMap::new();
        for definition in config.agents {
            if agents.contains_key(&definition.id) {
                return Err(ConciergeError::ConfigError {
                    reason: format!("agent '{}' is declared more than once", definition.id),
                });
            }
            agents.insert(definition.id, definition);
        }

        let registry = Self { agents, tools };
        registry.validate()?;

        debug!(
            agents = registry.agents.len(),
            tools = registry.tools.len(),
            "agent registry loaded"
        );
        Ok(registry)
    }

    /// Parse `s` as TOML and build a validated registry.
    pub fn from_toml_str(s: &str) -> ConciergeResult<Self> {
        let config: RegistryConfig = toml::from_str(s).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to parse agents TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as agent configuration.
    pub fn from_file(path: &Path) -> ConciergeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConciergeError::ConfigError {
            reason: format!("failed to read agents file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self { agents: BTreeMap::new(), tools: BTreeMap::new() }
    }

    fn validate(&self) -> ConciergeResult<()> {
        let triage = self.get(AgentId::Triage)?;

        for definition in self.agents.values() {
            for target in &definition.handoff_targets {
                if !self.contains(*target) {
                    return Err(ConciergeError::UnknownAgent { agent: *target });
                }
            }
            for tool in &definition.allowed_tools {
                if !self.tools.contains_key(tool) {
                    return Err(ConciergeError::ConfigError {
                        reason: format!(
                            "agent '{}' lists tool '{}' which is not in the tool catalog",
                            definition.id, tool
                        ),
                    });
                }
            }
        }

        let specialists: BTreeSet<AgentId> = AgentId::SPECIALISTS.into_iter().collect();
        for specialist in &specialists {
            if !self.contains(*specialist) {
                return Err(ConciergeError::UnknownAgent { agent: *specialist });
            }
        }
        if triage.handoff_targets != specialists {
            return Err(ConciergeError::ConfigError {
                reason: "triage must hand off to exactly billing, technical and general".to_string(),
            });
        }

        for definition in self.agents.values().filter(|d| d.id.is_specialist()) {
            if let Some(lateral) = definition.handoff_targets.iter().find(|t| **t != AgentId::Triage) {
                return Err(ConciergeError::ConfigError {
                    reason: format!(
                        "agent '{}' may only hand off to triage, not '{}'",
                        definition.id, lateral
                    ),
                });
            }
        }

        Ok(())
    }

    /// Look up an agent definition.
    pub fn get(&self, agent_id: AgentId) -> ConciergeResult<&AgentDefinition> {
        self.agents
            .get(&agent_id)
            .ok_or(ConciergeError::UnknownAgent { agent: agent_id })
    }

    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.agents.contains_key(&agent_id)
    }

    /// Look up a tool spec in the catalog.
    pub fn tool(&self, tool_id: &ToolId) -> Option<&ToolSpec> {
        self.tools.get(tool_id)
    }

    /// All registered agents, in `AgentId` order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    /// All catalogued tools, in id order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
