//! Per-session agent state.

use crate::errors::AgentError;
use std::any::{type_name, Any};
use std::fmt;

/// Session state for one agent or one pipeline.
///
/// A leaf agent keeps its private state behind [`AgentStates::Agent`];
/// pipelines keep one slot per node in [`AgentStates::Bundle`], indexed by
/// node position. A state object belongs to exactly one session.
pub enum AgentStates {
    /// State private to a leaf agent.
    Agent(Box<dyn Any + Send>),
    /// One state per node of a composite agent.
    Bundle(Vec<AgentStates>),
}

impl AgentStates {
    /// Wraps a leaf agent's state.
    #[must_use]
    pub fn new<T: Any + Send>(state: T) -> Self {
        Self::Agent(Box::new(state))
    }

    /// State for agents that keep nothing between calls.
    #[must_use]
    pub fn stateless() -> Self {
        Self::new(())
    }

    /// Builds a bundle from per-node states.
    #[must_use]
    pub fn bundle(states: impl IntoIterator<Item = Self>) -> Self {
        Self::Bundle(states.into_iter().collect())
    }

    /// Borrows the concrete state of a leaf agent.
    ///
    /// `agent` names the caller for the error message.
    pub fn downcast_ref<T: Any>(&self, agent: &str) -> Result<&T, AgentError> {
        match self {
            Self::Agent(state) => state
                .downcast_ref::<T>()
                .ok_or_else(|| AgentError::state_mismatch(agent, type_name::<T>())),
            Self::Bundle(_) => Err(AgentError::state_mismatch(agent, type_name::<T>())),
        }
    }

    /// Mutably borrows the concrete state of a leaf agent.
    pub fn downcast_mut<T: Any>(&mut self, agent: &str) -> Result<&mut T, AgentError> {
        match self {
            Self::Agent(state) => state
                .downcast_mut::<T>()
                .ok_or_else(|| AgentError::state_mismatch(agent, type_name::<T>())),
            Self::Bundle(_) => Err(AgentError::state_mismatch(agent, type_name::<T>())),
        }
    }

    /// Returns the per-node slots of a bundle holding exactly `len` states.
    pub fn slots_mut(&mut self, agent: &str, len: usize) -> Result<&mut [Self], AgentError> {
        match self {
            Self::Bundle(slots) => {
                if slots.len() == len {
                    Ok(slots)
                } else {
                    Err(AgentError::state_mismatch(
                        agent,
                        format!("a bundle of {len} states, got {}", slots.len()),
                    ))
                }
            }
            Self::Agent(_) => Err(AgentError::state_mismatch(
                agent,
                format!("a bundle of {len} states, got a leaf state"),
            )),
        }
    }

    /// Returns the number of slots for a bundle, `None` for a leaf state.
    #[must_use]
    pub fn bundle_len(&self) -> Option<usize> {
        match self {
            Self::Bundle(slots) => Some(slots.len()),
            Self::Agent(_) => None,
        }
    }
}

impl fmt::Debug for AgentStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(_) => f.write_str("AgentStates::Agent(..)"),
            Self::Bundle(slots) => f.debug_tuple("AgentStates::Bundle").field(slots).finish(),
        }
    }
}
