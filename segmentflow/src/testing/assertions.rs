//! Test assertions for segments and topology errors.

use crate::core::Segment;
use crate::errors::TopologyError;

/// Asserts that the segment carries exactly the expected text.
pub fn assert_text(segment: &Segment, expected: &str) {
    assert_eq!(
        segment.as_text(),
        Some(expected),
        "Expected text segment {expected:?}, got {segment:?}"
    );
}

/// Asserts that the segment is the empty sentinel.
pub fn assert_empty(segment: &Segment) {
    assert!(segment.is_empty(), "Expected an empty segment, got {segment:?}");
}

/// Asserts that the segment closes its stream.
pub fn assert_finished(segment: &Segment) {
    assert!(segment.finished, "Expected a finished segment, got {segment:?}");
}

/// Asserts that construction failed with the given contract error code.
///
/// Returns the error for further inspection.
pub fn assert_topology_error<T>(result: Result<T, TopologyError>, code: &str) -> TopologyError {
    let Err(err) = result else {
        panic!("Expected topology error {code}, but construction succeeded");
    };
    assert_eq!(
        err.code(),
        Some(code),
        "Expected topology error {code}, got: {err}"
    );
    err
}
