//! Mock agents for testing.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::agents::{Agent, AgentStates};
use crate::core::{Segment, SegmentContent, SegmentType};
use crate::errors::AgentError;

/// One recorded push.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Name of the agent that received the segment.
    pub agent: String,
    /// The segment it received.
    pub segment: Segment,
}

/// A journal shared by several recording agents.
pub type Journal = Arc<Mutex<Vec<JournalEntry>>>;

/// Creates an empty shared journal.
#[must_use]
pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// A pass-through agent that appends a suffix to text segments.
///
/// Every push produces exactly one queued output.
#[derive(Debug, Clone)]
pub struct SuffixAgent {
    name: String,
    suffix: String,
    source: SegmentType,
    target: SegmentType,
}

impl SuffixAgent {
    /// Creates a text-to-text suffix agent.
    #[must_use]
    pub fn new(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
            source: SegmentType::TEXT,
            target: SegmentType::TEXT,
        }
    }

    /// Overrides the declared segment types.
    #[must_use]
    pub fn with_types(mut self, source: SegmentType, target: SegmentType) -> Self {
        self.source = source;
        self.target = target;
        self
    }
}

impl Agent for SuffixAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SegmentType {
        self.source.clone()
    }

    fn target_type(&self) -> SegmentType {
        self.target.clone()
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::new(VecDeque::<Segment>::new())
    }

    fn push(&self, mut segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        let queue = states.downcast_mut::<VecDeque<Segment>>(&self.name)?;
        if let SegmentContent::Text { text } = &mut segment.content {
            text.push_str(&self.suffix);
        }
        queue.push_back(segment);
        Ok(())
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let queue = states.downcast_mut::<VecDeque<Segment>>(&self.name)?;
        Ok(queue.pop_front().unwrap_or_else(Segment::empty))
    }
}

#[derive(Debug, Default)]
struct WaitKState {
    buffer: VecDeque<Segment>,
    source_finished: bool,
}

/// An agent that withholds output until it has read `k` segments ahead.
///
/// Once the source is finished the remaining buffer is flushed one segment
/// per `pop`, the last one marked finished.
#[derive(Debug, Clone)]
pub struct WaitKAgent {
    name: String,
    k: usize,
    types: SegmentType,
}

impl WaitKAgent {
    /// Creates a text wait-k agent.
    #[must_use]
    pub fn new(name: impl Into<String>, k: usize) -> Self {
        Self {
            name: name.into(),
            k,
            types: SegmentType::TEXT,
        }
    }

    /// Uses `segment_type` for both input and output.
    #[must_use]
    pub fn with_type(mut self, segment_type: SegmentType) -> Self {
        self.types = segment_type;
        self
    }
}

impl Agent for WaitKAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SegmentType {
        self.types.clone()
    }

    fn target_type(&self) -> SegmentType {
        self.types.clone()
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::new(WaitKState::default())
    }

    fn reset(&self, states: &mut AgentStates) -> Result<(), AgentError> {
        let state = states.downcast_mut::<WaitKState>(&self.name)?;
        state.buffer.clear();
        state.source_finished = false;
        Ok(())
    }

    fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        let state = states.downcast_mut::<WaitKState>(&self.name)?;
        state.source_finished |= segment.finished;
        if !segment.is_empty() {
            state.buffer.push_back(segment);
        }
        Ok(())
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let state = states.downcast_mut::<WaitKState>(&self.name)?;
        if !state.source_finished && state.buffer.len() < self.k {
            return Ok(Segment::empty());
        }
        match state.buffer.pop_front() {
            Some(mut segment) => {
                segment.finished = state.source_finished && state.buffer.is_empty();
                Ok(segment)
            }
            None => Ok(Segment::empty()),
        }
    }
}

/// A pass-through agent that records every pushed segment in a journal.
#[derive(Debug, Clone)]
pub struct RecordingAgent {
    name: String,
    journal: Journal,
    source: SegmentType,
    target: SegmentType,
}

impl RecordingAgent {
    /// Creates a text recording agent writing to `journal`.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: Journal) -> Self {
        Self {
            name: name.into(),
            journal,
            source: SegmentType::TEXT,
            target: SegmentType::TEXT,
        }
    }

    /// Overrides the declared segment types.
    #[must_use]
    pub fn with_types(mut self, source: SegmentType, target: SegmentType) -> Self {
        self.source = source;
        self.target = target;
        self
    }
}

impl Agent for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SegmentType {
        self.source.clone()
    }

    fn target_type(&self) -> SegmentType {
        self.target.clone()
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::new(VecDeque::<Segment>::new())
    }

    fn push(&self, segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        self.journal.lock().push(JournalEntry {
            agent: self.name.clone(),
            segment: segment.clone(),
        });
        states
            .downcast_mut::<VecDeque<Segment>>(&self.name)?
            .push_back(segment);
        Ok(())
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let queue = states.downcast_mut::<VecDeque<Segment>>(&self.name)?;
        Ok(queue.pop_front().unwrap_or_else(Segment::empty))
    }
}

/// An agent that counts how many segments its session has seen.
///
/// `pop` reports the running count as text.
#[derive(Debug, Clone)]
pub struct CounterAgent {
    name: String,
}

impl CounterAgent {
    /// Creates a new counter agent.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Agent for CounterAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SegmentType {
        SegmentType::TEXT
    }

    fn target_type(&self) -> SegmentType {
        SegmentType::TEXT
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::new(0_usize)
    }

    fn push(&self, _segment: Segment, states: &mut AgentStates) -> Result<(), AgentError> {
        *states.downcast_mut::<usize>(&self.name)? += 1;
        Ok(())
    }

    fn pop(&self, states: &mut AgentStates) -> Result<Segment, AgentError> {
        let count = *states.downcast_ref::<usize>(&self.name)?;
        Ok(Segment::text(count.to_string()).with_index(count))
    }
}

/// An agent whose `push` always fails.
#[derive(Debug, Clone)]
pub struct FailingAgent {
    name: String,
    reason: String,
}

impl FailingAgent {
    /// Creates a new failing agent.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl Agent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SegmentType {
        SegmentType::TEXT
    }

    fn target_type(&self) -> SegmentType {
        SegmentType::TEXT
    }

    fn build_states(&self) -> AgentStates {
        AgentStates::stateless()
    }

    fn push(&self, _segment: Segment, _states: &mut AgentStates) -> Result<(), AgentError> {
        Err(AgentError::failed(&self.name, &self.reason))
    }

    fn pop(&self, _states: &mut AgentStates) -> Result<Segment, AgentError> {
        Ok(Segment::empty())
    }
}
