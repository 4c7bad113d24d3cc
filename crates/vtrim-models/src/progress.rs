//! Progress event schemas.
//!
//! Long-running stage calls stream these events back to the orchestrator,
//! which applies them in emission order and forwards them to the UI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::segment::SpeechSegment;

/// Progress event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// File upload percentage
    UploadProgress,
    /// Coarse phase label
    Status,
    /// Per-segment transcription progress
    SegmentProcessing,
    /// One segment's transcription finished
    SegmentComplete,
    /// Stage finished
    Complete,
}

impl ProgressEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressEventKind::UploadProgress => "upload_progress",
            ProgressEventKind::Status => "status",
            ProgressEventKind::SegmentProcessing => "segment_processing",
            ProgressEventKind::SegmentComplete => "segment_complete",
            ProgressEventKind::Complete => "complete",
        }
    }
}

/// Timing of the segment currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentWindow {
    /// Segment start in seconds
    pub start: f64,
    /// Segment end in seconds
    pub end: f64,
    /// Segment duration in seconds
    pub duration: f64,
}

impl From<&SpeechSegment> for SegmentWindow {
    fn from(segment: &SpeechSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            duration: segment.duration(),
        }
    }
}

/// Progress event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// File upload percentage
    UploadProgress {
        /// Percentage uploaded (0-100)
        progress: u8,
        message: String,
    },

    /// Coarse phase label (e.g. "Initializing...")
    Status { status: String, message: String },

    /// Per-segment transcription progress.
    ///
    /// `current_segment` is 1-indexed and never decreases within one run.
    SegmentProcessing {
        current_segment: u32,
        total_segments: u32,
        /// Overall completion percentage (0-100)
        percent: u8,
        status: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_segment_info: Option<SegmentWindow>,
    },

    /// One segment's transcription finished
    SegmentComplete {
        segment: SpeechSegment,
        result: String,
        current_segment: u32,
        status: String,
        message: String,
    },

    /// Stage finished; transient progress display should be cleared
    Complete,
}

impl ProgressEvent {
    /// Create an upload progress event (clamped to 100).
    pub fn upload_progress(progress: u8, message: impl Into<String>) -> Self {
        ProgressEvent::UploadProgress {
            progress: progress.min(100),
            message: message.into(),
        }
    }

    /// Create a coarse status event.
    pub fn status(status: impl Into<String>, message: impl Into<String>) -> Self {
        ProgressEvent::Status {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Create a per-segment processing event.
    pub fn segment_processing(
        current_segment: u32,
        total_segments: u32,
        status: impl Into<String>,
        message: impl Into<String>,
        current_segment_info: Option<SegmentWindow>,
    ) -> Self {
        let percent = if total_segments > 0 {
            ((current_segment.saturating_sub(1)) * 100 / total_segments).min(100) as u8
        } else {
            0
        };

        ProgressEvent::SegmentProcessing {
            current_segment,
            total_segments,
            percent,
            status: status.into(),
            message: message.into(),
            current_segment_info,
        }
    }

    /// Create a segment completion event.
    pub fn segment_complete(
        segment: SpeechSegment,
        result: impl Into<String>,
        current_segment: u32,
    ) -> Self {
        ProgressEvent::SegmentComplete {
            segment,
            result: result.into(),
            current_segment,
            status: "Segment Complete".to_string(),
            message: format!("Completed segment {}", current_segment),
        }
    }

    /// Create a stage completion event.
    pub fn complete() -> Self {
        ProgressEvent::Complete
    }

    /// Get the event kind.
    pub fn kind(&self) -> ProgressEventKind {
        match self {
            ProgressEvent::UploadProgress { .. } => ProgressEventKind::UploadProgress,
            ProgressEvent::Status { .. } => ProgressEventKind::Status,
            ProgressEvent::SegmentProcessing { .. } => ProgressEventKind::SegmentProcessing,
            ProgressEvent::SegmentComplete { .. } => ProgressEventKind::SegmentComplete,
            ProgressEvent::Complete => ProgressEventKind::Complete,
        }
    }
}
