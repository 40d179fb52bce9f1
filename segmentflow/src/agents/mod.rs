//! Agent trait and per-session state.
//!
//! Agents are the fundamental units of a segmentflow pipeline. An agent is
//! stateless itself: everything it accumulates during a streaming session
//! lives in the [`AgentStates`] it builds, so one agent instance can serve
//! many sessions at once.

mod registry;
mod states;

pub use registry::{AgentConfig, AgentFactory, AgentRegistry};
pub use states::AgentStates;

use crate::core::{Segment, SegmentType};
use crate::errors::AgentError;
use std::fmt::Debug;

/// Trait for incremental processing units.
///
/// Pipelines implement this trait too, so a pipeline can be used anywhere an
/// agent can, including as a stage of another pipeline.
pub trait Agent: Send + Sync + Debug {
    /// Returns the name of the agent.
    fn name(&self) -> &str;

    /// Human-readable description used when a pipeline is displayed.
    ///
    /// Pipelines return their full, possibly multi-line, stage listing.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// The type of segment this agent consumes.
    fn source_type(&self) -> SegmentType;

    /// The type of segment this agent produces.
    fn target_type(&self) -> SegmentType;

    /// Builds a fresh, independent state for one session.
    fn build_states(&self) -> AgentStates;

    /// Returns a state to its initial condition.
    ///
    /// The default replaces it with a freshly built state.
    fn reset(&self, states: &mut AgentStates) -> Result<(), AgentError> {
        *states = self.build_states();
        Ok(())
    }

    /// Feeds one segment. May buffer; does not need a matching `pop`.
    fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError>;

    /// Retrieves the next available output.
    ///
    /// Returns [`Segment::empty`] when nothing is ready instead of failing.
    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError>;

    /// Pushes a segment and immediately pops.
    fn pushpop(&self, segment: Segment, states: &mut AgentStates) -> Result<Segment, AgentError> {
        self.push(segment, states)?;
        self.pop(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Upper-cases text, holding at most one pending segment.
    #[derive(Debug)]
    struct Upper;

    impl Agent for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn source_type(&self) -> SegmentType {
            SegmentType::TEXT
        }

        fn target_type(&self) -> SegmentType {
            SegmentType::TEXT
        }

        fn build_states(&self) -> AgentStates {
            AgentStates::new(Option::<Segment>::None)
        }

        fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
            let pending = states.downcast_mut::<Option<Segment>>(self.name())?;
            let text = segment.as_text().unwrap_or_default().to_uppercase();
            *pending = Some(Segment::text(text));
            Ok(())
        }

        fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
            let pending = states.downcast_mut::<Option<Segment>>(self.name())?;
            Ok(pending.take().unwrap_or_else(Segment::empty))
        }
    }

    #[test]
    fn test_pushpop_defaults_to_push_then_pop() {
        let agent = Upper;
        let mut states = agent.build_states();

        let out = agent.pushpop(Segment::text("hi"), &mut states).unwrap();
        assert_eq!(out.as_text(), Some("HI"));
        assert!(agent.pop(&mut states).unwrap().is_empty());
    }

    #[test]
    fn test_default_reset_rebuilds_state() {
        let agent = Upper;
        let mut states = agent.build_states();

        agent.push(Segment::text("pending"), &mut states).unwrap();
        agent.reset(&mut states).unwrap();
        assert!(agent.pop(&mut states).unwrap().is_empty());
    }

    #[test]
    fn test_pop_without_push_is_empty() {
        let agent = Upper;
        let mut states = agent.build_states();
        assert!(agent.pop(&mut states).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_state_is_rejected() {
        let agent = Upper;
        let mut states = AgentStates::new(42_i32);
        assert!(agent.push(Segment::text("x"), &mut states).is_err());
    }
}
