//! A pipeline of either shape.

use super::{LinearPipeline, TreePipeline};
use crate::agents::{Agent, AgentStates};
use crate::core::{Segment, SegmentType};
use crate::errors::AgentError;
use std::fmt;

/// A validated pipeline, linear or tree-shaped.
///
/// Pipelines built from a topology description come back as this type.
#[derive(Debug, Clone)]
pub enum Pipeline {
    /// An ordered chain of agents.
    Linear(LinearPipeline),
    /// A rooted tree of agents.
    Tree(TreePipeline),
}

impl Pipeline {
    fn inner(&self) -> &dyn Agent {
        match self {
            Self::Linear(pipeline) => pipeline,
            Self::Tree(pipeline) => pipeline,
        }
    }
}

impl Agent for Pipeline {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }

    fn source_type(&self) -> SegmentType {
        self.inner().source_type()
    }

    fn target_type(&self) -> SegmentType {
        self.inner().target_type()
    }

    fn build_states(&self) -> AgentStates {
        self.inner().build_states()
    }

    fn reset(&self, states: &mut AgentStates) -> Result<(), AgentError> {
        self.inner().reset(states)
    }

    fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        self.inner().push(segment, states)
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        self.inner().pop(states)
    }
}

impl From<LinearPipeline> for Pipeline {
    fn from(pipeline: LinearPipeline) -> Self {
        Self::Linear(pipeline)
    }
}

impl From<TreePipeline> for Pipeline {
    fn from(pipeline: TreePipeline) -> Self {
        Self::Tree(pipeline)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear(pipeline) => fmt::Display::fmt(pipeline, f),
            Self::Tree(pipeline) => fmt::Display::fmt(pipeline, f),
        }
    }
}
