//! Tree-shaped pipelines with fan-out.

use super::write_nested;
use crate::agents::{Agent, AgentStates};
use crate::core::{Segment, SegmentType};
use crate::errors::AgentError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Index of a node in a [`TreePipeline`]'s arena.
pub type NodeId = usize;

/// A validated node.
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    /// Stable identifier from the topology description.
    pub(crate) id: String,
    /// The agent run at this node.
    pub(crate) agent: Arc<dyn Agent>,
    /// Direct children, in declared order.
    pub(crate) children: Vec<NodeId>,
}

/// A directed tree of agents with one root and one or more leaves.
///
/// Every push is a depth-first traversal from the root: inner nodes run
/// `pushpop` and hand an identical copy of their output to each child, and
/// leaves only `push`. `pop` collects one output per leaf.
///
/// Build one with [`TreePipelineBuilder`](super::TreePipelineBuilder).
#[derive(Debug, Clone)]
pub struct TreePipeline {
    /// The pipeline name.
    name: String,
    /// Node arena; state bundles use the same indices.
    nodes: Vec<TreeNode>,
    /// The unique node without a parent.
    root: NodeId,
    /// Nodes without children, in declared order.
    leaves: Vec<NodeId>,
    /// Leaf selected by `pop`, if any.
    output_index: Option<usize>,
}

impl TreePipeline {
    /// Assembles a pipeline from an already validated structure.
    pub(crate) fn from_validated(
        name: String,
        nodes: Vec<TreeNode>,
        root: NodeId,
        leaves: Vec<NodeId>,
        output_index: Option<usize>,
    ) -> Self {
        Self {
            name,
            nodes,
            root,
            leaves,
            output_index,
        }
    }

    /// Returns the identifier of the root node.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.nodes[self.root].id
    }

    /// Returns the identifiers of the leaf nodes in output order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&str> {
        self.leaves.iter().map(|&leaf| self.nodes[leaf].id.as_str()).collect()
    }

    /// Returns the identifiers of a node's children, or `None` for an unknown node.
    #[must_use]
    pub fn children(&self, id: &str) -> Option<Vec<&str>> {
        let node = self.nodes.iter().find(|node| node.id == id)?;
        Some(
            node.children
                .iter()
                .map(|&child| self.nodes[child].id.as_str())
                .collect(),
        )
    }

    /// Returns the agent registered under `id`.
    #[must_use]
    pub fn agent(&self, id: &str) -> Option<&Arc<dyn Agent>> {
        self.nodes.iter().find(|node| node.id == id).map(|node| &node.agent)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the configured output index.
    #[must_use]
    pub fn output_index(&self) -> Option<usize> {
        self.output_index
    }

    /// Pops every leaf and returns the outputs in leaf order.
    ///
    /// This ignores the output index.
    pub fn pop_all(&self, states: &mut AgentStates) -> Result<Vec<Segment>, AgentError> {
        let slots = states.slots_mut(&self.name, self.nodes.len())?;
        self.leaves
            .iter()
            .map(|&leaf| self.nodes[leaf].agent.pop(&mut slots[leaf]))
            .collect()
    }

    fn push_node(
        &self,
        node: NodeId,
        segment: Segment,
        slots: &mut [AgentStates],
    ) -> Result<(), AgentError> {
        let TreeNode { id, agent, children } = &self.nodes[node];

        if children.is_empty() {
            tracing::trace!(pipeline = %self.name, node = %id, "Leaf buffered segment");
            return agent.push(segment, &mut slots[node]);
        }

        let output = agent.pushpop(segment, &mut slots[node])?;
        tracing::trace!(
            pipeline = %self.name,
            node = %id,
            fan_out = children.len(),
            "Node forwarded segment"
        );

        for &child in children {
            self.push_node(child, output.clone(), slots)?;
        }
        Ok(())
    }
}

impl Agent for TreePipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn source_type(&self) -> SegmentType {
        self.nodes[self.root].agent.source_type()
    }

    /// The selected leaf's type, or all leaf types joined with `_`.
    fn target_type(&self) -> SegmentType {
        if let Some(index) = self.output_index {
            return self.nodes[self.leaves[index]].agent.target_type();
        }
        let types: Vec<SegmentType> = self
            .leaves
            .iter()
            .map(|&leaf| self.nodes[leaf].agent.target_type())
            .collect();
        SegmentType::joined(&types)
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::bundle(self.nodes.iter().map(|node| node.agent.build_states()))
    }

    fn reset(&self, states: &mut AgentStates) -> Result<(), AgentError> {
        let slots = states.slots_mut(&self.name, self.nodes.len())?;
        for (node, slot) in self.nodes.iter().zip(slots.iter_mut()) {
            node.agent.reset(slot)?;
        }
        Ok(())
    }

    fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        let slots = states.slots_mut(&self.name, self.nodes.len())?;
        let started = Instant::now();
        self.push_node(self.root, segment, slots)?;
        tracing::trace!(
            pipeline = %self.name,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Segment pushed"
        );
        Ok(())
    }

    /// Pops every leaf; returns the selected leaf's output when an output
    /// index is configured, otherwise a composite of all outputs.
    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let outputs = self.pop_all(states)?;
        match self.output_index {
            Some(index) => outputs.into_iter().nth(index).ok_or_else(|| {
                AgentError::state_mismatch(&self.name, format!("an output for leaf {index}"))
            }),
            None => Ok(Segment::composite(outputs)),
        }
    }
}

impl fmt::Display for TreePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}(", self.name)?;
        for node in &self.nodes {
            write!(f, "\t{}: ", node.id)?;
            write_nested(f, &node.agent.describe())?;
            if !node.children.is_empty() {
                let children: Vec<&str> = node
                    .children
                    .iter()
                    .map(|&child| self.nodes[child].id.as_str())
                    .collect();
                write!(f, " -> [{}]", children.join(", "))?;
            }
            f.write_str("\n")?;
        }
        f.write_str(")")
    }
}
