//! Linear chains of agents.

use super::write_nested;
use crate::agents::{Agent, AgentStates};
use crate::core::{Segment, SegmentType};
use crate::errors::{codes, AgentError, ContractErrorInfo, TopologyError};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An ordered chain of agents that behaves as a single agent.
///
/// Every stage but the last is driven with `pushpop`, so only the final
/// stage holds output between a `push` and the next `pop`.
#[derive(Debug, Clone)]
pub struct LinearPipeline {
    /// The pipeline name.
    name: String,
    /// The stages, first to last.
    agents: Vec<Arc<dyn Agent>>,
}

impl LinearPipeline {
    /// Creates a validated linear pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if `agents` is empty or if any stage's source type
    /// differs from the previous stage's target type.
    pub fn new(
        name: impl Into<String>,
        agents: Vec<Arc<dyn Agent>>,
    ) -> Result<Self, TopologyError> {
        let name = name.into();

        if agents.is_empty() {
            return Err(TopologyError::new(format!("Pipeline '{name}' has no agents"))
                .with_error_info(
                    ContractErrorInfo::new(codes::EMPTY, "Cannot build an empty pipeline")
                        .with_fix_hint("Add at least one agent to the pipeline."),
                ));
        }

        for pair in agents.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let (target, source) = (prev.target_type(), next.source_type());
            if source != target {
                return Err(TopologyError::type_mismatch(
                    prev.name(),
                    &target,
                    next.name(),
                    &source,
                ));
            }
        }

        tracing::debug!(
            pipeline = %name,
            stages = agents.len(),
            source_type = %agents[0].source_type(),
            target_type = %agents[agents.len() - 1].target_type(),
            "Linear pipeline validated"
        );

        Ok(Self { name, agents })
    }

    /// Returns the stages in order.
    #[must_use]
    pub fn agents(&self) -> &[Arc<dyn Agent>] {
        &self.agents
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Always false: construction rejects empty chains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    // Construction guarantees at least one stage.
    fn first(&self) -> &Arc<dyn Agent> {
        &self.agents[0]
    }

    fn last(&self) -> &Arc<dyn Agent> {
        &self.agents[self.agents.len() - 1]
    }
}

impl Agent for LinearPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn source_type(&self) -> SegmentType {
        self.first().source_type()
    }

    fn target_type(&self) -> SegmentType {
        self.last().target_type()
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::bundle(self.agents.iter().map(|agent| agent.build_states()))
    }

    fn reset(&self, states: &mut AgentStates) -> Result<(), AgentError> {
        let slots = states.slots_mut(&self.name, self.agents.len())?;
        for (agent, slot) in self.agents.iter().zip(slots.iter_mut()) {
            agent.reset(slot)?;
        }
        Ok(())
    }

    fn push(
        &self,
        segment: Segment,
        states: &mut AgentStates,
    ) -> Result<(), AgentError> {
        let slots = states.slots_mut(&self.name, self.agents.len())?;
        let (last_slot, stage_slots) = slots
            .split_last_mut()
            .ok_or_else(|| AgentError::state_mismatch(&self.name, "a non-empty bundle"))?;

        let started = Instant::now();
        let mut segment = segment;
        for (agent, slot) in self.agents.iter().zip(stage_slots.iter_mut()) {
            segment = agent.pushpop(segment, slot)?;
            tracing::trace!(pipeline = %self.name, stage = agent.name(), "Stage forwarded segment");
        }
        self.last().push(segment, last_slot)?;
        tracing::trace!(
            pipeline = %self.name,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Segment pushed"
        );
        Ok(())
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let slots = states.slots_mut(&self.name, self.agents.len())?;
        let last_slot = slots
            .last_mut()
            .ok_or_else(|| AgentError::state_mismatch(&self.name, "a non-empty bundle"))?;
        self.last().pop(last_slot)
    }
}

impl fmt::Display for LinearPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}(", self.name)?;
        for agent in &self.agents {
            f.write_str("\t")?;
            write_nested(f, &agent.describe())?;
            f.write_str("\n")?;
        }
        f.write_str(")")
    }
}
