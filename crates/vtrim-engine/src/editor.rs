//! Manual segment editing.
//!
//! After AI filtering the user can hand-tune the kept segments. The editor
//! replaces the filtered list wholesale and validates the replacement; the
//! pre-filter transcript and the detected timing stay available for
//! comparison.

use serde::{Deserialize, Serialize};

use vtrim_models::{
    original_duration, total_segment_duration, validate_segment_list, SpeechSegment,
};

use crate::error::{EngineError, EngineResult};
use crate::session::PipelineState;

/// Presentation-oriented duration totals, recomputed from the current lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    /// Sum of kept segment durations in seconds
    pub total_segment_duration: f64,
    /// End of the last detected segment in seconds
    pub original_duration: f64,
}

/// Compute duration totals for the session's current segment lists.
pub fn summarize(state: &PipelineState) -> DurationSummary {
    DurationSummary {
        total_segment_duration: state
            .best_segments()
            .map(|s| total_segment_duration(s))
            .unwrap_or(0.0),
        original_duration: state
            .raw_segments
            .as_deref()
            .and_then(original_duration)
            .unwrap_or(0.0),
    }
}

/// Replace the edited segment list.
///
/// Rejects lists that are degenerate, unsorted, or overlapping before any
/// state changes.
pub fn apply_manual_edit(
    state: &mut PipelineState,
    segments: Vec<SpeechSegment>,
) -> EngineResult<()> {
    validate_segment_list(&segments)?;

    if state.raw_segments.is_none() {
        return Err(EngineError::invalid_phase("edit segments", state.phase));
    }

    state.filtered_segments = Some(segments);
    Ok(())
}
