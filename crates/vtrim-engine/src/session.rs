//! Session-scoped pipeline state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vtrim_models::{
    original_duration, total_segment_duration, DetectionParams, PipelinePhase, SessionId,
    SpeechSegment, UploadInfo, VideoFile,
};

use crate::confirm::ConfirmGate;
use crate::error::{EngineError, EngineResult};

/// Long-running stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Detection,
    Transcription,
    Filtering,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Detection => "detection",
            StageKind::Transcription => "transcription",
            StageKind::Filtering => "filtering",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One segment's finished transcription, accumulated during a run.
///
/// `index` is the 1-indexed segment number from the progress stream; the
/// list is append-only for the lifetime of a single run and tolerates
/// out-of-order arrival by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTranscription {
    pub index: u32,
    pub segment: SpeechSegment,
    pub result: String,
}

/// The canonical state of one editing session.
///
/// Owned exclusively by the session's orchestrator; every mutation happens
/// through its operations. The `epoch` counter increments whenever a new
/// file is selected, letting in-flight stage completions detect that they
/// have been superseded.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub phase: PipelinePhase,
    pub file: Option<VideoFile>,
    pub detection_params: DetectionParams,
    pub raw_segments: Option<Vec<SpeechSegment>>,
    pub transcribed_segments: Option<Vec<SpeechSegment>>,
    pub filtered_segments: Option<Vec<SpeechSegment>>,
    pub audio_url: Option<String>,
    pub upload_info: Option<UploadInfo>,
    pub completed_transcriptions: Vec<CompletedTranscription>,
    pub filter_model: Option<String>,
    pub filter_note: Option<String>,
    pub confirm: ConfirmGate,
    epoch: u64,
    in_flight: Option<StageKind>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the current file selection; changes on every selection.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The stage currently running, if any.
    pub fn in_flight(&self) -> Option<StageKind> {
        self.in_flight
    }

    /// Select a new file, abandoning everything derived from the old one.
    ///
    /// In-flight stage results for the previous file are invalidated by the
    /// epoch bump and discarded on arrival.
    pub fn select_file(&mut self, file: VideoFile) {
        self.epoch += 1;
        self.phase = PipelinePhase::Idle;
        self.file = Some(file);
        self.raw_segments = None;
        self.transcribed_segments = None;
        self.filtered_segments = None;
        self.audio_url = None;
        self.upload_info = None;
        self.completed_transcriptions.clear();
        self.filter_model = None;
        self.filter_note = None;
        self.confirm.reset();
        self.in_flight = None;
    }

    /// Mark a stage as running; at most one stage runs per session.
    pub fn begin_stage(&mut self, kind: StageKind) -> EngineResult<()> {
        if let Some(running) = self.in_flight {
            return Err(EngineError::StageInFlight(running));
        }
        self.in_flight = Some(kind);
        Ok(())
    }

    /// Mark the running stage as finished.
    pub fn end_stage(&mut self) {
        self.in_flight = None;
    }

    /// Whether transcription output exists that a destructive action would lose.
    pub fn has_transcription(&self) -> bool {
        self.transcribed_segments.is_some() || self.filtered_segments.is_some()
    }

    /// Drop transcription and filtering output, returning to the detected
    /// state. Detected segments and the upload handle survive.
    pub fn clear_transcription(&mut self) {
        self.transcribed_segments = None;
        self.filtered_segments = None;
        self.completed_transcriptions.clear();
        self.filter_model = None;
        self.filter_note = None;
        if self.raw_segments.is_some() {
            self.phase = PipelinePhase::Detected;
        }
    }

    /// The most refined segment list available.
    pub fn best_segments(&self) -> Option<&Vec<SpeechSegment>> {
        self.filtered_segments
            .as_ref()
            .or(self.transcribed_segments.as_ref())
            .or(self.raw_segments.as_ref())
    }

    /// Upload handle valid for the active file, if any.
    ///
    /// A handle bound to a different file identity is never reused.
    pub fn reusable_upload_info(&self) -> Option<&UploadInfo> {
        let file = self.file.as_ref()?;
        self.upload_info
            .as_ref()
            .filter(|info| info.matches(&file.identity()))
    }

    /// Serializable view of the session for API consumers.
    pub fn snapshot(&self, session_id: &SessionId, created_at: DateTime<Utc>) -> PipelineSnapshot {
        let total = self.best_segments().map(|s| total_segment_duration(s));
        let original = self
            .raw_segments
            .as_deref()
            .and_then(original_duration);

        PipelineSnapshot {
            session_id: session_id.clone(),
            created_at,
            phase: self.phase,
            file: self.file.clone(),
            detection_params: self.detection_params,
            raw_segments: self.raw_segments.clone(),
            transcribed_segments: self.transcribed_segments.clone(),
            filtered_segments: self.filtered_segments.clone(),
            audio_url: self.audio_url.clone(),
            upload_info: self.upload_info.clone(),
            completed_transcriptions: self.completed_transcriptions.clone(),
            filter_model: self.filter_model.clone(),
            filter_note: self.filter_note.clone(),
            pending_confirmation: self.confirm.is_pending(),
            total_segment_duration: total.unwrap_or(0.0),
            original_duration: original.unwrap_or(0.0),
        }
    }
}

/// Serializable view of a session's pipeline state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub phase: PipelinePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<VideoFile>,
    pub detection_params: DetectionParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_segments: Option<Vec<SpeechSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribed_segments: Option<Vec<SpeechSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_segments: Option<Vec<SpeechSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_info: Option<UploadInfo>,
    pub completed_transcriptions: Vec<CompletedTranscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_note: Option<String>,
    pub pending_confirmation: bool,
    pub total_segment_duration: f64,
    pub original_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> VideoFile {
        VideoFile::new(format!("/videos/{}", name), name, size)
    }

    fn upload_for(name: &str, size: u64) -> UploadInfo {
        UploadInfo {
            file_path: format!("/uploads/abc/{}", name),
            file_name: name.to_string(),
            file_size: size,
            session_id: "abc".to_string(),
        }
    }

    #[test]
    fn test_select_file_resets_everything_and_bumps_epoch() {
        let mut state = PipelineState::new();
        state.select_file(file("talk.mp4", 100));
        let epoch = state.epoch();

        state.phase = PipelinePhase::Filtered;
        state.raw_segments = Some(vec![SpeechSegment::new(0.0, 2.0)]);
        state.transcribed_segments = Some(vec![SpeechSegment::new(0.0, 2.0)]);
        state.filtered_segments = Some(vec![]);
        state.upload_info = Some(upload_for("talk.mp4", 100));
        state.audio_url = Some("/audio/talk.wav".to_string());
        state.begin_stage(StageKind::Detection).unwrap();

        state.select_file(file("other.mp4", 200));

        assert_eq!(state.epoch(), epoch + 1);
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert!(state.raw_segments.is_none());
        assert!(state.transcribed_segments.is_none());
        assert!(state.filtered_segments.is_none());
        assert!(state.upload_info.is_none());
        assert!(state.audio_url.is_none());
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn test_single_stage_at_a_time() {
        let mut state = PipelineState::new();
        state.begin_stage(StageKind::Detection).unwrap();

        let err = state.begin_stage(StageKind::Transcription).unwrap_err();
        assert!(matches!(err, EngineError::StageInFlight(StageKind::Detection)));

        state.end_stage();
        assert!(state.begin_stage(StageKind::Transcription).is_ok());
    }

    #[test]
    fn test_clear_transcription_keeps_detection_output() {
        let mut state = PipelineState::new();
        state.select_file(file("talk.mp4", 100));
        state.raw_segments = Some(vec![SpeechSegment::new(0.0, 2.0)]);
        state.upload_info = Some(upload_for("talk.mp4", 100));
        state.transcribed_segments = Some(vec![SpeechSegment::new(0.0, 2.0)]);
        state.filtered_segments = Some(vec![]);
        state.phase = PipelinePhase::Filtered;

        state.clear_transcription();

        assert_eq!(state.phase, PipelinePhase::Detected);
        assert!(state.raw_segments.is_some());
        assert!(state.upload_info.is_some());
        assert!(state.transcribed_segments.is_none());
        assert!(state.filtered_segments.is_none());
    }

    #[test]
    fn test_reusable_upload_info_requires_matching_identity() {
        let mut state = PipelineState::new();
        state.select_file(file("talk.mp4", 100));
        state.upload_info = Some(upload_for("talk.mp4", 100));
        assert!(state.reusable_upload_info().is_some());

        // A handle left over for a different file must not be reused.
        state.upload_info = Some(upload_for("other.mp4", 999));
        assert!(state.reusable_upload_info().is_none());
    }

    #[test]
    fn test_best_segments_prefers_most_refined() {
        let mut state = PipelineState::new();
        assert!(state.best_segments().is_none());

        state.raw_segments = Some(vec![SpeechSegment::new(0.0, 1.0)]);
        state.transcribed_segments = Some(vec![SpeechSegment::new(0.0, 2.0)]);
        assert_eq!(state.best_segments().unwrap()[0].end, 2.0);

        state.filtered_segments = Some(vec![SpeechSegment::new(0.0, 3.0)]);
        assert_eq!(state.best_segments().unwrap()[0].end, 3.0);
    }
}
