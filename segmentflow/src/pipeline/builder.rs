//! Tree pipeline builder with validation.

use super::tree::{NodeId, TreeNode};
use super::{PipelineConfig, TreePipeline};
use crate::agents::Agent;
use crate::errors::{codes, ContractErrorInfo, CycleDetectedError, TopologyError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A node as declared, before validation.
#[derive(Debug, Clone)]
struct NodeDecl {
    id: String,
    agent: Arc<dyn Agent>,
    children: Vec<String>,
}

/// Builder for creating validated tree pipelines.
///
/// Nodes may reference children that are declared later; everything is
/// checked once, in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TreePipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Declared nodes, in declaration order.
    nodes: Vec<NodeDecl>,
    /// Output selection.
    config: PipelineConfig,
}

impl TreePipelineBuilder {
    /// Creates a new tree pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Declares a node and the identifiers of its direct children.
    ///
    /// A node with no children is a leaf.
    #[must_use]
    pub fn node(mut self, id: impl Into<String>, agent: Arc<dyn Agent>, children: &[&str]) -> Self {
        self.add_node(id, agent, children.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Declares a node with owned child identifiers.
    pub fn add_node(&mut self, id: impl Into<String>, agent: Arc<dyn Agent>, children: Vec<String>) {
        self.nodes.push(NodeDecl {
            id: id.into(),
            agent,
            children,
        });
    }

    /// Makes `pop` return only the output of the leaf at `index`.
    #[must_use]
    pub fn output_index(mut self, index: usize) -> Self {
        self.config.output_index = Some(index);
        self
    }

    /// Replaces the pipeline configuration.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of declared nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the topology and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology is empty, declares a node twice,
    /// reuses one agent instance, references an unknown child, connects
    /// agents with different segment types, gives a node several parents,
    /// has anything but exactly one root, has no leaf, contains a cycle, or
    /// if the output index does not select a leaf.
    pub fn build(self) -> Result<TreePipeline, TopologyError> {
        if self.nodes.is_empty() {
            return Err(TopologyError::new(format!("Pipeline '{}' has no agents", self.name))
                .with_error_info(
                    ContractErrorInfo::new(codes::EMPTY, "Cannot build an empty pipeline")
                        .with_fix_hint("Declare at least one node before building."),
                ));
        }

        let index = self.index_nodes()?;
        let mut parents: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut leaves = Vec::new();

        for (parent_id, decl) in self.nodes.iter().enumerate() {
            if decl.children.is_empty() {
                leaves.push(parent_id);
            }

            let mut children = Vec::with_capacity(decl.children.len());
            for child_name in &decl.children {
                let child_id = *index
                    .get(child_name.as_str())
                    .ok_or_else(|| unknown_child(&decl.id, child_name))?;
                let child = &self.nodes[child_id];

                let (target, source) = (decl.agent.target_type(), child.agent.source_type());
                if source != target {
                    return Err(TopologyError::type_mismatch(&decl.id, &target, &child.id, &source));
                }

                if let Some(previous) = parents[child_id] {
                    return Err(multiple_parents(
                        &child.id,
                        &self.nodes[previous].id,
                        &decl.id,
                    ));
                }
                parents[child_id] = Some(parent_id);
                children.push(child_id);
            }

            nodes.push(TreeNode {
                id: decl.id.clone(),
                agent: Arc::clone(&decl.agent),
                children,
            });
        }

        if leaves.is_empty() {
            return Err(TopologyError::new(format!(
                "Pipeline '{}' has no leaf: every node has at least one child",
                self.name
            ))
            .with_agents(nodes.iter().map(|node| node.id.clone()).collect())
            .with_error_info(
                ContractErrorInfo::new(codes::NO_LEAF, "A tree pipeline needs at least one output node")
                    .with_fix_hint("Declare at least one node with an empty children list."),
            ));
        }

        let roots: Vec<NodeId> = (0..nodes.len()).filter(|&id| parents[id].is_none()).collect();
        let root = match roots.as_slice() {
            [root] => *root,
            _ => return Err(root_error(&nodes, &roots)),
        };

        detect_cycles(&nodes, &parents, root)?;

        if let Some(output_index) = self.config.output_index {
            if output_index >= leaves.len() {
                return Err(TopologyError::new(format!(
                    "Output index {output_index} is out of range for {} leaves",
                    leaves.len()
                ))
                .with_agents(leaves.iter().map(|&leaf| nodes[leaf].id.clone()).collect())
                .with_error_info(
                    ContractErrorInfo::new(codes::OUTPUT_INDEX, "Output index does not select a leaf")
                        .with_context_entry("output_index", output_index.to_string())
                        .with_context_entry("leaves", leaves.len().to_string()),
                ));
            }
        }

        tracing::debug!(
            pipeline = %self.name,
            nodes = nodes.len(),
            root = %nodes[root].id,
            leaves = ?leaves.iter().map(|&leaf| nodes[leaf].id.as_str()).collect::<Vec<_>>(),
            output_index = ?self.config.output_index,
            "Tree pipeline validated"
        );

        Ok(TreePipeline::from_validated(
            self.name,
            nodes,
            root,
            leaves,
            self.config.output_index,
        ))
    }

    /// Maps identifiers to arena indices, rejecting duplicate identifiers and
    /// agent instances shared between nodes.
    fn index_nodes(&self) -> Result<HashMap<&str, NodeId>, TopologyError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        let mut instances: HashMap<*const (), &str> = HashMap::with_capacity(self.nodes.len());

        for (node_id, decl) in self.nodes.iter().enumerate() {
            if index.insert(decl.id.as_str(), node_id).is_some() {
                return Err(TopologyError::new(format!("Node '{}' is declared twice", decl.id))
                    .with_agents(vec![decl.id.clone()])
                    .with_error_info(
                        ContractErrorInfo::new(codes::DUPLICATE_NODE, "Node identifiers must be unique")
                            .with_fix_hint("Rename one of the nodes."),
                    ));
            }

            let instance = Arc::as_ptr(&decl.agent).cast::<()>();
            if let Some(other) = instances.insert(instance, decl.id.as_str()) {
                return Err(TopologyError::new(format!(
                    "Nodes '{other}' and '{}' share the same agent instance",
                    decl.id
                ))
                .with_agents(vec![other.to_string(), decl.id.clone()])
                .with_error_info(
                    ContractErrorInfo::new(
                        codes::DUPLICATE_AGENT,
                        "Each node needs its own agent instance",
                    )
                    .with_fix_hint("Construct a separate agent for every node."),
                ));
            }
        }

        Ok(index)
    }
}

fn unknown_child(parent: &str, child: &str) -> TopologyError {
    TopologyError::new(format!("Node '{parent}' lists unknown child '{child}'"))
        .with_agents(vec![parent.to_string(), child.to_string()])
        .with_error_info(
            ContractErrorInfo::new(codes::UNKNOWN_CHILD, format!("Child '{child}' not found"))
                .with_fix_hint("Declare every child as a node of the pipeline."),
        )
}

fn multiple_parents(child: &str, first: &str, second: &str) -> TopologyError {
    TopologyError::new(format!(
        "Node '{child}' has more than one parent ('{first}' and '{second}')"
    ))
    .with_agents(vec![child.to_string(), first.to_string(), second.to_string()])
    .with_error_info(
        ContractErrorInfo::new(codes::MULTIPLE_PARENTS, "A node may have only one incoming edge")
            .with_fix_hint("Give each branch its own agent instance."),
    )
}

fn root_error(nodes: &[TreeNode], roots: &[NodeId]) -> TopologyError {
    let names: Vec<String> = roots.iter().map(|&root| nodes[root].id.clone()).collect();
    let message = if names.is_empty() {
        "Pipeline has no root: every node is somebody's child".to_string()
    } else {
        format!(
            "Pipeline must have exactly one root, found {}: {}",
            names.len(),
            names.join(", ")
        )
    };
    TopologyError::new(message)
        .with_agents(names)
        .with_error_info(
            ContractErrorInfo::new(codes::ROOT, "A tree pipeline needs exactly one input node")
                .with_fix_hint("Connect every node except the input to exactly one parent."),
        )
}

/// Rejects nodes that cannot be reached from the root.
///
/// Every node has at most one parent and only the root has none, so an
/// unreachable node always sits on (or below) a cycle.
fn detect_cycles(
    nodes: &[TreeNode],
    parents: &[Option<NodeId>],
    root: NodeId,
) -> Result<(), CycleDetectedError> {
    let mut reached = vec![false; nodes.len()];
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !std::mem::replace(&mut reached[node], true) {
            stack.extend(nodes[node].children.iter().copied());
        }
    }

    let Some(start) = reached.iter().position(|&r| !r) else {
        return Ok(());
    };

    // Walk up the parent links until a node repeats.
    let mut path = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;
    while let Some(parent) = parents[current] {
        if !seen.insert(parent) {
            let cycle_start = path.iter().position(|&n| n == parent).unwrap_or(0);
            // Parent links point backwards along the edges.
            let mut cycle: Vec<String> = path[cycle_start..]
                .iter()
                .rev()
                .map(|&n| nodes[n].id.clone())
                .collect();
            cycle.push(nodes[current].id.clone());
            return Err(CycleDetectedError::new(cycle));
        }
        path.push(parent);
        current = parent;
    }

    Err(CycleDetectedError::new(vec![nodes[start].id.clone()]))
}
