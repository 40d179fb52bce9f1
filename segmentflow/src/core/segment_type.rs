//! Symbolic segment type tags.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A symbolic tag describing the kind of data an agent consumes or produces.
///
/// Tags are compared by value when a pipeline is validated and are never
/// inspected while segments flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentType(Cow<'static, str>);

impl SegmentType {
    /// Plain text.
    pub const TEXT: Self = Self(Cow::Borrowed("text"));
    /// Raw speech samples.
    pub const SPEECH: Self = Self(Cow::Borrowed("speech"));

    /// Separator used for composite tags.
    pub const SEPARATOR: &'static str = "_";

    /// Creates a tag from any string.
    #[must_use]
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// Joins several tags into a single composite tag (`"text_speech"`).
    #[must_use]
    pub fn joined<'a>(tags: impl IntoIterator<Item = &'a Self>) -> Self {
        let joined = tags
            .into_iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(Self::SEPARATOR);
        Self(Cow::Owned(joined))
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for SegmentType {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for SegmentType {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl AsRef<str> for SegmentType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
