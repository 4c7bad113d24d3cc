//! Pipeline phase state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an editing session in the stage sequence.
///
/// Phases only advance through successful stage completions. A failed stage
/// leaves the phase at its pre-call value; discarding a transcription moves
/// back to `Detected`; selecting a new file resets to `Idle` unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// No file selected or nothing processed yet
    #[default]
    Idle,
    /// File upload in progress
    Uploading,
    /// Silence detection in progress
    Detecting,
    /// Silence detection completed
    Detected,
    /// Transcription in progress
    Transcribing,
    /// Transcription completed
    Transcribed,
    /// AI filtering in progress
    Filtering,
    /// AI filtering completed
    Filtered,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Idle => "idle",
            PipelinePhase::Uploading => "uploading",
            PipelinePhase::Detecting => "detecting",
            PipelinePhase::Detected => "detected",
            PipelinePhase::Transcribing => "transcribing",
            PipelinePhase::Transcribed => "transcribed",
            PipelinePhase::Filtering => "filtering",
            PipelinePhase::Filtered => "filtered",
        }
    }

    /// Whether silence detection has completed for the current file.
    pub fn has_detection(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Detected
                | PipelinePhase::Transcribing
                | PipelinePhase::Transcribed
                | PipelinePhase::Filtering
                | PipelinePhase::Filtered
        )
    }

    /// Whether transcription output exists (or is being produced) and would
    /// be destroyed by a re-detection or discard.
    pub fn has_transcription(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Transcribing
                | PipelinePhase::Transcribed
                | PipelinePhase::Filtering
                | PipelinePhase::Filtered
        )
    }

    /// Whether a long-running stage is currently in flight.
    pub fn is_stage_running(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Uploading
                | PipelinePhase::Detecting
                | PipelinePhase::Transcribing
                | PipelinePhase::Filtering
        )
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(PipelinePhase::default(), PipelinePhase::Idle);
    }

    #[test]
    fn test_has_detection() {
        assert!(!PipelinePhase::Idle.has_detection());
        assert!(!PipelinePhase::Detecting.has_detection());
        assert!(PipelinePhase::Detected.has_detection());
        assert!(PipelinePhase::Filtered.has_detection());
    }

    #[test]
    fn test_has_transcription() {
        assert!(!PipelinePhase::Detected.has_transcription());
        assert!(PipelinePhase::Transcribing.has_transcription());
        assert!(PipelinePhase::Transcribed.has_transcription());
        assert!(PipelinePhase::Filtering.has_transcription());
        assert!(PipelinePhase::Filtered.has_transcription());
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&PipelinePhase::Transcribed).unwrap();
        assert_eq!(json, "\"transcribed\"");
    }
}
