//! The tool gate: which tools the active agent may invoke this turn.
//!
//! The granted set is the agent's static `allowed_tools` intersected with
//! the tools whose `ToolEligibility` admits the current context. It is a
//! pure function of the agent id and the context, so two calls with an
//! unchanged context always agree.

use std::collections::BTreeSet;

use tracing::debug;

use concierge_contracts::{
    agent::AgentId,
    error::ConciergeResult,
    tool::{ToolId, ToolSpec},
};

use crate::{registry::AgentRegistry, session::Context};

/// Compute the tools `agent_id` may invoke given `context`.
///
/// Fails only with `UnknownAgent` when the agent is not registered.
pub fn allowed_tools(
    registry: &AgentRegistry,
    agent_id: AgentId,
    context: &Context,
) -> ConciergeResult<BTreeSet<ToolId>> {
    let definition = registry.get(agent_id)?;

    let granted: BTreeSet<ToolId> = definition
        .allowed_tools
        .iter()
        .filter(|tool| {
            registry
                .tool(tool)
                .is_some_and(|spec| spec.eligibility.admits(context.is_premium(), context.issue_type()))
        })
        .cloned()
        .collect();

    debug!(
        session_id = %context.session_id(),
        agent = %agent_id,
        granted = granted.len(),
        withheld = definition.allowed_tools.len() - granted.len(),
        "tool gate evaluated"
    );

    Ok(granted)
}

/// Resolve granted tool ids to their catalog specs, in id order.
pub fn granted_specs(registry: &AgentRegistry, granted: &BTreeSet<ToolId>) -> Vec<ToolSpec> {
    granted
        .iter()
        .filter_map(|id| registry.tool(id).cloned())
        .collect()
}
