//! Core domain model types for segmentflow.
//!
//! This module contains the data that flows through pipelines:
//! - Segments and their payloads
//! - Symbolic segment type tags used for construction-time checks

mod segment;
mod segment_type;

pub use segment::{Segment, SegmentContent};
pub use segment_type::SegmentType;
