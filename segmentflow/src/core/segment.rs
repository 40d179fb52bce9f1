//! Segments: the discrete units exchanged between agents.

use serde::{Deserialize, Serialize};

/// Payload carried by a segment.
///
/// Pipelines never look inside a payload; they only clone segments when a
/// node fans out to several children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentContent {
    /// No output is available yet.
    #[default]
    Empty,
    /// A chunk of text.
    Text {
        /// The text content.
        text: String,
    },
    /// A chunk of speech samples.
    Speech {
        /// Mono samples.
        samples: Vec<f32>,
        /// Sample rate in Hz.
        sample_rate: u32,
    },
    /// One segment per pipeline output, in leaf order.
    Composite {
        /// The member segments.
        segments: Vec<Segment>,
    },
}

/// A unit of streamed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Segment {
    /// Position of the segment in its stream.
    #[serde(default)]
    pub index: usize,
    /// The payload.
    #[serde(flatten)]
    pub content: SegmentContent,
    /// Whether this is the last segment of the stream.
    #[serde(default)]
    pub finished: bool,
}

impl Segment {
    /// The "no output yet" sentinel.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a text segment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: SegmentContent::Text { text: text.into() },
            ..Self::default()
        }
    }

    /// Creates a speech segment.
    #[must_use]
    pub fn speech(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            content: SegmentContent::Speech {
                samples,
                sample_rate,
            },
            ..Self::default()
        }
    }

    /// Wraps several segments into one.
    ///
    /// The composite is finished only once every member is finished.
    #[must_use]
    pub fn composite(segments: Vec<Self>) -> Self {
        let finished = !segments.is_empty() && segments.iter().all(|s| s.finished);
        Self {
            content: SegmentContent::Composite { segments },
            finished,
            ..Self::default()
        }
    }

    /// Sets the stream index.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Marks the segment as the end of its stream.
    #[must_use]
    pub fn finished(mut self) -> Self {
        self.finished = true;
        self
    }

    /// Returns true for the "no output yet" sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.content, SegmentContent::Empty)
    }

    /// Returns the text content, if this is a text segment.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            SegmentContent::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Returns the member segments, if this is a composite segment.
    #[must_use]
    pub fn as_composite(&self) -> Option<&[Self]> {
        match &self.content {
            SegmentContent::Composite { segments } => Some(segments),
            _ => None,
        }
    }

    /// Consumes a composite segment and returns its members.
    #[must_use]
    pub fn into_composite(self) -> Option<Vec<Self>> {
        match self.content {
            SegmentContent::Composite { segments } => Some(segments),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let seg = Segment::empty();
        assert!(seg.is_empty());
        assert!(!seg.finished);
        assert_eq!(seg.as_text(), None);
    }

    #[test]
    fn test_text_builders() {
        let seg = Segment::text("hello").with_index(3).finished();
        assert_eq!(seg.as_text(), Some("hello"));
        assert_eq!(seg.index, 3);
        assert!(seg.finished);
        assert!(!seg.is_empty());
    }

    #[test]
    fn test_composite_finished_only_when_all_members_are() {
        let partial = Segment::composite(vec![Segment::text("a").finished(), Segment::empty()]);
        assert!(!partial.finished);

        let done = Segment::composite(vec![
            Segment::text("a").finished(),
            Segment::text("b").finished(),
        ]);
        assert!(done.finished);
        assert_eq!(done.as_composite().map(<[Segment]>::len), Some(2));

        assert!(!Segment::composite(Vec::new()).finished);
    }

    #[test]
    fn test_json_shape() {
        let seg = Segment::text("hi").with_index(1);
        let value = serde_json::to_value(&seg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"index": 1, "type": "text", "text": "hi", "finished": false})
        );

        let back: Segment = serde_json::from_value(value).unwrap();
        assert_eq!(back, seg);
    }
}
