//! Pipeline composition.
//!
//! This module provides:
//! - Linear pipelines that chain agents in order
//! - Tree pipelines that fan one input out to several branches
//! - A builder that validates tree topologies
//! - Serializable topology descriptions

mod builder;
mod composite;
mod linear;
mod spec;
mod tree;

#[cfg(test)]
mod integration_tests;

pub use builder::TreePipelineBuilder;
pub use composite::Pipeline;
pub use linear::LinearPipeline;
pub use spec::{AgentSpec, PipelineConfig, Topology, TopologySpec, TreeNodeSpec};
pub use tree::{NodeId, TreePipeline};

use std::fmt;

/// Writes a possibly multi-line description, indenting every line after the
/// first by one tab so nested pipelines line up under their parent.
fn write_nested(f: &mut fmt::Formatter<'_>, description: &str) -> fmt::Result {
    let mut lines = description.lines();
    if let Some(first) = lines.next() {
        f.write_str(first)?;
    }
    for line in lines {
        write!(f, "\n\t{line}")?;
    }
    Ok(())
}
