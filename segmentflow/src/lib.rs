//! # Segmentflow
//!
//! Composition of incremental processing agents into streaming pipelines.
//!
//! An agent consumes segments one at a time and may withhold output until it
//! has read enough input. Segmentflow lets such agents be assembled into:
//!
//! - **Linear pipelines**: a chain where each agent feeds the next
//! - **Tree pipelines**: a rooted tree where one input fans out to several
//!   branches, each ending in an output
//! - **Nested pipelines**: every pipeline is itself an agent
//!
//! Topologies are validated once, when they are built. Agents hold no
//! per-session data; each session carries its own [`agents::AgentStates`],
//! so one pipeline can serve many sessions concurrently.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use segmentflow::prelude::*;
//!
//! let tree = TreePipelineBuilder::new("speech")
//!     .node("asr", asr, &["mt", "tts"])
//!     .node("mt", mt, &[])
//!     .node("tts", tts, &[])
//!     .build()?;
//!
//! let mut states = tree.build_states();
//! tree.push(segment, &mut states)?;
//! let outputs = tree.pop_all(&mut states)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod agents;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agents::{Agent, AgentConfig, AgentRegistry, AgentStates};
    pub use crate::core::{Segment, SegmentContent, SegmentType};
    pub use crate::errors::{
        AgentError, ConfigError, ContractErrorInfo, CycleDetectedError, SegmentflowError,
        TopologyError,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        LinearPipeline, Pipeline, PipelineConfig, TopologySpec, TreePipeline,
        TreePipelineBuilder,
    };
}
