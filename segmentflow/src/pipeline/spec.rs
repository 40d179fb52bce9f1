//! Serializable topology descriptions.

use super::{LinearPipeline, Pipeline, TreePipelineBuilder};
use crate::agents::{Agent, AgentConfig, AgentRegistry};
use crate::errors::{codes, ConfigError, ContractErrorInfo, TopologyError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Output selection for tree pipelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Index of the single leaf whose output `pop` returns.
    #[serde(default)]
    pub output_index: Option<usize>,
}

/// How one node obtains its agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentSpec {
    /// An agent built by a registered factory.
    Registered {
        /// The registered agent kind.
        agent: String,
        /// Configuration handed to the factory.
        #[serde(default)]
        config: AgentConfig,
    },
    /// A nested pipeline used as a single agent.
    Nested {
        /// The nested topology.
        pipeline: Box<TopologySpec>,
    },
}

/// A tree node description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodeSpec {
    /// Unique node identifier.
    pub id: String,
    /// Identifiers of the direct children; empty for leaves.
    #[serde(default)]
    pub children: Vec<String>,
    /// The node's agent.
    #[serde(flatten)]
    pub agent: AgentSpec,
}

/// The shape of a described pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Stages in order.
    Linear(Vec<AgentSpec>),
    /// Nodes in declaration order.
    Tree(Vec<TreeNodeSpec>),
}

/// Description of an entire pipeline.
///
/// ```json
/// {
///   "name": "speech-to-text",
///   "agent_defaults": {"sample_rate": 16000},
///   "topology": {"linear": [{"agent": "asr"}, {"agent": "mt", "config": {"lang": "de"}}]}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    /// The pipeline name.
    pub name: String,
    /// The stages or nodes.
    pub topology: Topology,
    /// Output selection.
    #[serde(default)]
    pub config: PipelineConfig,
    /// Configuration shared by every agent; node keys take precedence.
    #[serde(default)]
    pub agent_defaults: AgentConfig,
}

impl TopologySpec {
    /// Parses a description from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a topology.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a description file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading topology description");
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Instantiates every agent through `registry` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a kind is not registered, a factory fails, or the
    /// assembled topology is invalid.
    pub fn build(&self, registry: &AgentRegistry) -> Result<Pipeline, ConfigError> {
        self.build_with_defaults(registry, &AgentConfig::new())
    }

    /// Nested pipelines inherit the enclosing defaults under their own.
    fn build_with_defaults(
        &self,
        registry: &AgentRegistry,
        inherited: &AgentConfig,
    ) -> Result<Pipeline, ConfigError> {
        let defaults = merged(inherited, &self.agent_defaults);

        let pipeline = match &self.topology {
            Topology::Linear(stages) => {
                if self.config.output_index.is_some() {
                    return Err(TopologyError::new(format!(
                        "Pipeline '{}' is linear and cannot select an output index",
                        self.name
                    ))
                    .with_error_info(
                        ContractErrorInfo::new(
                            codes::OUTPUT_INDEX,
                            "Output selection applies to tree pipelines only",
                        )
                        .with_fix_hint("Remove 'output_index' from the config."),
                    )
                    .into());
                }

                let agents = stages
                    .iter()
                    .enumerate()
                    .map(|(position, stage)| {
                        instantiate(registry, &position.to_string(), stage, &defaults)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Pipeline::Linear(LinearPipeline::new(self.name.clone(), agents)?)
            }
            Topology::Tree(nodes) => {
                let mut builder = TreePipelineBuilder::new(self.name.clone()).config(self.config);
                for node in nodes {
                    let agent = instantiate(registry, &node.id, &node.agent, &defaults)?;
                    builder.add_node(node.id.clone(), agent, node.children.clone());
                }
                Pipeline::Tree(builder.build()?)
            }
        };

        Ok(pipeline)
    }
}

fn merged(base: &AgentConfig, overrides: &AgentConfig) -> AgentConfig {
    let mut config = base.clone();
    config.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    config
}

fn instantiate(
    registry: &AgentRegistry,
    node: &str,
    spec: &AgentSpec,
    defaults: &AgentConfig,
) -> Result<Arc<dyn Agent>, ConfigError> {
    match spec {
        AgentSpec::Registered { agent: kind, config } => {
            let config = merged(defaults, config);
            let agent = registry
                .build(kind, &config)
                .ok_or_else(|| ConfigError::UnknownAgent {
                    node: node.to_string(),
                    kind: kind.clone(),
                })?
                .map_err(|source| ConfigError::Factory {
                    node: node.to_string(),
                    kind: kind.clone(),
                    source,
                })?;
            tracing::trace!(node, agent_kind = %kind, agent = agent.name(), "Instantiated agent");
            Ok(agent)
        }
        AgentSpec::Nested { pipeline } => {
            Ok(Arc::new(pipeline.build_with_defaults(registry, defaults)?))
        }
    }
}
