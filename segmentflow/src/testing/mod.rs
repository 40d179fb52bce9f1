//! Testing utilities for segmentflow pipelines.
//!
//! This module provides:
//! - Mock agents with observable behavior
//! - Canonical topologies and a registry of mock agent kinds
//! - Assertions for segments and topology errors

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_empty, assert_finished, assert_text, assert_topology_error};
pub use fixtures::{fan_out_tree, mock_registry, speech_tree};
pub use mocks::{
    journal, CounterAgent, FailingAgent, Journal, JournalEntry, RecordingAgent, SuffixAgent,
    WaitKAgent,
};
