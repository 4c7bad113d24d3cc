//! Speech segment model.
//!
//! A segment is a `[start, end)` interval of the source video, produced by
//! silence detection and later annotated with transcript text and a filter
//! disposition. Segment lists are always ordered by start time and
//! non-overlapping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who produced a filter annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterOrigin {
    /// Annotated by the AI filtering stage
    Ai,
    /// Annotated by a manual edit
    User,
}

/// What happened to a segment during filtering/editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterDisposition {
    /// Segment kept as-is
    Kept,
    /// Segment removed from the final cut
    Dropped,
    /// Segment timing or transcript adjusted
    Edited,
}

/// Filter annotation attached to a segment after AI filtering or manual editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterAnnotation {
    /// Disposition of the segment
    pub disposition: FilterDisposition,
    /// Who made the decision
    pub origin: FilterOrigin,
}

/// A speech interval of the source video.
///
/// Identity is positional within an ordered sequence; there is no separate ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpeechSegment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds (always greater than `start`)
    pub end: f64,

    /// Transcript text (present once transcription has run on this segment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Filter annotation (present once AI filtering or manual editing has run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<FilterAnnotation>,
}

impl SpeechSegment {
    /// Create a new unannotated segment.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            transcript: None,
            annotation: None,
        }
    }

    /// Attach transcript text.
    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    /// Attach a filter annotation.
    pub fn with_annotation(mut self, disposition: FilterDisposition, origin: FilterOrigin) -> Self {
        self.annotation = Some(FilterAnnotation {
            disposition,
            origin,
        });
        self
    }

    /// Duration of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the segment's own timing invariant.
    pub fn is_well_formed(&self) -> bool {
        self.start >= 0.0 && self.end > self.start
    }
}

/// Segment list validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentListError {
    /// A segment has `start >= end` or a negative start
    #[error("Segment {index} is degenerate: start {start}s, end {end}s")]
    Degenerate { index: usize, start: f64, end: f64 },

    /// The list is not sorted by start time
    #[error("Segment {index} starts before the previous segment")]
    Unsorted { index: usize },

    /// Two consecutive segments overlap
    #[error("Segment {index} overlaps the previous segment")]
    Overlapping { index: usize },
}

/// Validate ordering and timing invariants over a whole segment list.
///
/// Checks, for every segment:
/// - `start >= 0` and `end > start`
/// - non-decreasing ordering by `start`
/// - no overlap with the previous segment
pub fn validate_segment_list(segments: &[SpeechSegment]) -> Result<(), SegmentListError> {
    for (index, segment) in segments.iter().enumerate() {
        if !segment.is_well_formed() {
            return Err(SegmentListError::Degenerate {
                index,
                start: segment.start,
                end: segment.end,
            });
        }

        if index > 0 {
            let prev = &segments[index - 1];
            if segment.start < prev.start {
                return Err(SegmentListError::Unsorted { index });
            }
            if segment.start < prev.end {
                return Err(SegmentListError::Overlapping { index });
            }
        }
    }

    Ok(())
}

/// Sum of segment durations in seconds.
pub fn total_segment_duration(segments: &[SpeechSegment]) -> f64 {
    segments.iter().map(SpeechSegment::duration).sum()
}

/// End of the last segment in seconds.
///
/// With a sorted list this is the playable extent of the original recording.
pub fn original_duration(segments: &[SpeechSegment]) -> Option<f64> {
    segments.last().map(|s| s.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(pairs: &[(f64, f64)]) -> Vec<SpeechSegment> {
        pairs.iter().map(|&(s, e)| SpeechSegment::new(s, e)).collect()
    }

    #[test]
    fn test_segment_duration() {
        let seg = SpeechSegment::new(1.5, 4.0);
        assert!((seg.duration() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_ok() {
        let list = segs(&[(0.0, 2.0), (5.0, 8.0), (10.0, 11.0)]);
        assert!(validate_segment_list(&list).is_ok());
    }

    #[test]
    fn test_validate_touching_segments_ok() {
        // Half-open intervals may touch without overlapping.
        let list = segs(&[(0.0, 2.0), (2.0, 3.0)]);
        assert!(validate_segment_list(&list).is_ok());
    }

    #[test]
    fn test_validate_degenerate() {
        let list = segs(&[(0.0, 2.0), (3.0, 3.0)]);
        assert!(matches!(
            validate_segment_list(&list),
            Err(SegmentListError::Degenerate { index: 1, .. })
        ));

        let negative = segs(&[(-1.0, 2.0)]);
        assert!(matches!(
            validate_segment_list(&negative),
            Err(SegmentListError::Degenerate { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_unsorted() {
        let list = segs(&[(5.0, 8.0), (0.0, 2.0)]);
        assert!(matches!(
            validate_segment_list(&list),
            Err(SegmentListError::Unsorted { index: 1 })
        ));
    }

    #[test]
    fn test_validate_overlapping() {
        let list = segs(&[(0.0, 4.0), (3.0, 6.0)]);
        assert!(matches!(
            validate_segment_list(&list),
            Err(SegmentListError::Overlapping { index: 1 })
        ));
    }

    #[test]
    fn test_durations() {
        let list = segs(&[(0.0, 2.0), (5.0, 8.0), (10.0, 11.0)]);
        assert!((total_segment_duration(&list) - 6.0).abs() < f64::EPSILON);
        assert_eq!(original_duration(&list), Some(11.0));
        assert_eq!(original_duration(&[]), None);
    }

    #[test]
    fn test_serialization_omits_empty_annotations() {
        let seg = SpeechSegment::new(0.0, 1.0);
        let json = serde_json::to_string(&seg).unwrap();
        assert!(!json.contains("transcript"));
        assert!(!json.contains("annotation"));

        let annotated = seg
            .with_transcript("hello")
            .with_annotation(FilterDisposition::Kept, FilterOrigin::Ai);
        let json = serde_json::to_string(&annotated).unwrap();
        assert!(json.contains("\"transcript\":\"hello\""));
        assert!(json.contains("\"disposition\":\"kept\""));
        assert!(json.contains("\"origin\":\"ai\""));
    }
}
