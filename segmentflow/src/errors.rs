//! Error types for the segmentflow engine.
//!
//! Topology errors are raised only while a pipeline is being constructed.
//! Agent errors are raised while segments flow and are propagated unchanged.

use crate::core::SegmentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Contract error codes attached to [`TopologyError`]s.
pub mod codes {
    /// The topology declares no agents.
    pub const EMPTY: &str = "TOPOLOGY-001-EMPTY";
    /// Two nodes share an identifier.
    pub const DUPLICATE_NODE: &str = "TOPOLOGY-002-DUPLICATE_NODE";
    /// One agent instance is registered under several identifiers.
    pub const DUPLICATE_AGENT: &str = "TOPOLOGY-003-DUPLICATE_AGENT";
    /// A child identifier does not name any node.
    pub const UNKNOWN_CHILD: &str = "TOPOLOGY-004-UNKNOWN_CHILD";
    /// Adjacent agents exchange different segment types.
    pub const TYPE_MISMATCH: &str = "TOPOLOGY-005-TYPE_MISMATCH";
    /// A node is listed as the child of more than one parent.
    pub const MULTIPLE_PARENTS: &str = "TOPOLOGY-006-MULTIPLE_PARENTS";
    /// The graph does not have exactly one root.
    pub const ROOT: &str = "TOPOLOGY-007-ROOT";
    /// The graph has no leaf.
    pub const NO_LEAF: &str = "TOPOLOGY-008-NO_LEAF";
    /// The graph contains a cycle.
    pub const CYCLE: &str = "TOPOLOGY-009-CYCLE";
    /// The configured output index does not select a leaf.
    pub const OUTPUT_INDEX: &str = "TOPOLOGY-010-OUTPUT_INDEX";
}

/// The main error type for segmentflow operations.
#[derive(Debug, Error)]
pub enum SegmentflowError {
    /// A pipeline topology was rejected at construction.
    #[error("{0}")]
    Topology(#[from] TopologyError),

    /// An agent failed while processing a segment.
    #[error("{0}")]
    Agent(#[from] AgentError),

    /// A topology description could not be loaded or instantiated.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "TOPOLOGY-009-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline topology is invalid.
///
/// A pipeline is never constructed when this error is returned.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TopologyError {
    /// The error message.
    pub message: String,
    /// Identifiers of the agents involved in the error.
    pub agents: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl TopologyError {
    /// Creates a new topology error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agents: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the agents involved.
    #[must_use]
    pub fn with_agents(mut self, agents: Vec<String>) -> Self {
        self.agents = agents;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Builds the error for an edge whose endpoints exchange different types.
    #[must_use]
    pub fn type_mismatch(
        parent: &str,
        parent_target: &SegmentType,
        child: &str,
        child_source: &SegmentType,
    ) -> Self {
        Self::new(format!(
            "{child}.source_type({child_source}) != {parent}.target_type({parent_target})"
        ))
        .with_agents(vec![parent.to_string(), child.to_string()])
        .with_error_info(
            ContractErrorInfo::new(
                codes::TYPE_MISMATCH,
                format!("Agent '{child}' cannot consume the output of '{parent}'"),
            )
            .with_context_entry("parent_target_type", parent_target.as_str())
            .with_context_entry("child_source_type", child_source.as_str())
            .with_fix_hint("Insert an agent converting between the two segment types."),
        )
    }
}

/// Error raised when a cycle is detected in a tree topology.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of nodes forming the cycle.
    pub cycle_path: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            codes::CYCLE,
            format!("Pipeline contains a cycle: {}", cycle_path.join(" -> ")),
        )
        .with_fix_hint("Remove one of the edges in the cycle to break it.");

        Self {
            cycle_path,
            error_info: info,
        }
    }
}

impl From<CycleDetectedError> for TopologyError {
    fn from(err: CycleDetectedError) -> Self {
        Self {
            message: err.to_string(),
            agents: err.cycle_path.clone(),
            error_info: Some(err.error_info),
        }
    }
}

/// Errors raised by agents while segments flow.
#[derive(Debug, Error)]
pub enum AgentError {
    /// An agent received a state object it did not build.
    #[error("State mismatch for agent '{agent}': expected {expected}")]
    StateMismatch {
        /// The agent name.
        agent: String,
        /// What the agent expected to receive.
        expected: String,
    },

    /// An agent failed to process a segment.
    #[error("Agent '{agent}' failed: {reason}")]
    Failed {
        /// The agent name.
        agent: String,
        /// The reason for failure.
        reason: String,
    },

    /// Any other agent-specific failure.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl AgentError {
    /// Creates a state mismatch error.
    #[must_use]
    pub fn state_mismatch(agent: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::StateMismatch {
            agent: agent.into(),
            expected: expected.into(),
        }
    }

    /// Creates a processing failure error.
    #[must_use]
    pub fn failed(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            agent: agent.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading or instantiating a topology description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A node names an agent kind that was never registered.
    #[error("Unknown agent kind '{kind}' for node '{node}'")]
    UnknownAgent {
        /// The node identifier.
        node: String,
        /// The requested agent kind.
        kind: String,
    },

    /// An agent factory rejected its configuration.
    #[error("Failed to build agent '{kind}' for node '{node}': {source}")]
    Factory {
        /// The node identifier.
        node: String,
        /// The agent kind.
        kind: String,
        /// The factory error.
        #[source]
        source: anyhow::Error,
    },

    /// The description is not valid JSON for a topology.
    #[error("Invalid topology description: {0}")]
    Parse(#[from] serde_json::Error),

    /// The description file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The described topology is structurally invalid.
    #[error("{0}")]
    Topology(#[from] TopologyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_error_builders() {
        let err = TopologyError::new("bad")
            .with_agents(vec!["a".to_string()])
            .with_error_info(ContractErrorInfo::new(codes::ROOT, "two roots"));

        assert_eq!(err.to_string(), "bad");
        assert_eq!(err.agents, vec!["a".to_string()]);
        assert_eq!(err.code(), Some(codes::ROOT));
    }

    #[test]
    fn test_type_mismatch_names_both_sides() {
        let err = TopologyError::type_mismatch("asr", &SegmentType::TEXT, "tts", &SegmentType::SPEECH);
        let msg = err.to_string();

        assert!(msg.contains("tts.source_type(speech)"));
        assert!(msg.contains("asr.target_type(text)"));
        assert_eq!(err.code(), Some(codes::TYPE_MISMATCH));
        let info = err.error_info.unwrap();
        assert_eq!(info.context.get("child_source_type").map(String::as_str), Some("speech"));
    }

    #[test]
    fn test_cycle_converts_to_topology_error() {
        let cycle = CycleDetectedError::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(cycle.to_string(), "Cycle detected in pipeline: a -> b -> a");

        let err: TopologyError = cycle.into();
        assert_eq!(err.code(), Some(codes::CYCLE));
        assert_eq!(err.agents.len(), 3);
    }

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::failed("mt", "model unavailable");
        assert_eq!(err.to_string(), "Agent 'mt' failed: model unavailable");

        let err: AgentError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_umbrella_conversions() {
        let err: SegmentflowError = TopologyError::new("x").into();
        assert!(matches!(err, SegmentflowError::Topology(_)));

        let err: SegmentflowError = AgentError::state_mismatch("a", "bundle").into();
        assert!(matches!(err, SegmentflowError::Agent(_)));
    }
}
