//! Pipeline orchestration.
//!
//! One [`PipelineSession`] exists per selected file. It drives each stage's
//! external call, translates streamed progress events into state updates,
//! enforces stage ordering, and guards against the races the UI can create
//! while a network call is suspended: re-entrant stage starts, destructive
//! actions without confirmation, and stage results arriving after the file
//! they belong to was replaced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};

use vtrim_export::{
    create_xml_from_segments, export_file_name, ExportArtifact, ExportSettings,
};
use vtrim_models::{
    validate_segment_list, DetectionParams, InstallationInstructions, PipelinePhase,
    ProgressEvent, SessionId, SpeechSegment, VideoFile,
};
use vtrim_services::StageServices;

use crate::config::EngineConfig;
use crate::confirm::PendingAction;
use crate::editor::{self, DurationSummary};
use crate::error::{EngineError, EngineResult};
use crate::logging::SessionLogger;
use crate::progress::ProgressChannel;
use crate::session::{CompletedTranscription, PipelineSnapshot, PipelineState, StageKind};

/// Informational note used when the AI filter kept every segment.
pub const NO_FILTER_EFFECT_NOTE: &str =
    "AI did not filter out any segments. All segments were kept as is.";

/// Result of a completed detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Detected speech segments
    pub segments: Vec<SpeechSegment>,
    /// Audio preview URL returned by the service
    pub audio_url: String,
    /// Recomputed duration totals
    pub durations: DurationSummary,
    /// Timeline export produced alongside the re-detection, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportArtifact>,
}

/// Outcome of a detection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Detection ran to completion
    Completed(DetectionSummary),
    /// A transcript exists; the destructive re-detection awaits confirmation
    ConfirmationRequired,
}

/// Outcome of a transcription run.
///
/// Failure keeps the segments finished before the error; they stay usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscriptionOutcome {
    /// All segments transcribed
    Completed { segments: Vec<SpeechSegment> },
    /// The run failed, possibly after partial progress
    Failed {
        completed: Vec<CompletedTranscription>,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        installation_instructions: Option<InstallationInstructions>,
    },
}

/// Outcome of an AI filtering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// Segments the filter kept
    pub segments: Vec<SpeechSegment>,
    /// Model identifier reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Informational note (warnings, or the kept-everything notice)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Outcome of a discard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscardOutcome {
    /// Transcription and filtering output dropped
    Discarded,
    /// A transcript exists; the discard awaits confirmation
    ConfirmationRequired,
}

/// Outcome of confirming a pending destructive action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PendingOutcome {
    /// The pending discard was executed
    Discarded,
    /// The pending re-detection was executed
    Redetected(DetectionSummary),
}

/// Orchestrator for one editing session.
pub struct PipelineSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    config: EngineConfig,
    services: Arc<dyn StageServices>,
    progress: ProgressChannel,
    state: Mutex<PipelineState>,
}

impl PipelineSession {
    /// Create a new session with no file selected.
    pub fn new(services: Arc<dyn StageServices>, config: EngineConfig) -> Self {
        let progress = ProgressChannel::new(config.progress_capacity);
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            config,
            services,
            progress,
            state: Mutex::new(PipelineState::new()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Subscribe to this session's progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Serializable view of the current pipeline state.
    pub async fn snapshot(&self) -> PipelineSnapshot {
        let state = self.state.lock().await;
        state.snapshot(&self.id, self.created_at)
    }

    /// Select a (new) file, abandoning all previous work for this session.
    pub async fn select_file(&self, file: VideoFile) {
        let logger = SessionLogger::new(&self.id, "file_selection");
        let mut state = self.state.lock().await;
        if state.file.is_some() {
            logger.log_progress("Replacing selected file; discarding derived state");
        }
        state.select_file(file);
    }

    /// Run silence detection with the given parameters.
    ///
    /// With an existing transcript this parks the destructive re-detection
    /// behind the confirmation gate instead of running it.
    pub async fn run_detection(&self, params: DetectionParams) -> EngineResult<DetectionOutcome> {
        self.apply_detection_params(params, None).await
    }

    /// Run silence detection with new parameters, optionally producing a
    /// timeline export from the fresh segments as a side effect.
    pub async fn apply_detection_params(
        &self,
        params: DetectionParams,
        export: Option<ExportSettings>,
    ) -> EngineResult<DetectionOutcome> {
        params.validate()?;

        {
            let mut state = self.state.lock().await;
            if state.file.is_none() {
                return Err(EngineError::NoFile);
            }
            if let Some(running) = state.in_flight() {
                return Err(EngineError::StageInFlight(running));
            }
            if state.has_transcription() {
                // Changing detection output invalidates the transcript
                // alignment, so the user must approve losing it first.
                state.confirm.request(PendingAction::Redetect { params, export });
                return Ok(DetectionOutcome::ConfirmationRequired);
            }
        }

        let summary = self.detect(params, export).await?;
        Ok(DetectionOutcome::Completed(summary))
    }

    /// Execute the pending destructive action after user confirmation.
    pub async fn confirm_pending(&self) -> EngineResult<PendingOutcome> {
        let action = {
            let mut state = self.state.lock().await;
            state.confirm.take_confirmed()?
        };

        match action {
            PendingAction::Discard => {
                let mut state = self.state.lock().await;
                state.clear_transcription();
                Ok(PendingOutcome::Discarded)
            }
            PendingAction::Redetect { params, export } => {
                {
                    let mut state = self.state.lock().await;
                    state.clear_transcription();
                }
                let summary = self.detect(params, export).await?;
                Ok(PendingOutcome::Redetected(summary))
            }
        }
    }

    /// Cancel the pending destructive action; all state stays untouched.
    pub async fn cancel_pending(&self) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        state.confirm.cancel()
    }

    /// Request dropping the transcription (and filtering) output.
    pub async fn discard_transcription(&self) -> EngineResult<DiscardOutcome> {
        let mut state = self.state.lock().await;
        if let Some(running) = state.in_flight() {
            return Err(EngineError::StageInFlight(running));
        }
        if !state.has_transcription() {
            return Err(EngineError::invalid_phase("discard a transcription", state.phase));
        }

        state.confirm.request(PendingAction::Discard);
        Ok(DiscardOutcome::ConfirmationRequired)
    }

    /// Transcribe the detected segments, streaming per-segment progress.
    pub async fn run_transcription(
        &self,
        language: Option<&str>,
    ) -> EngineResult<TranscriptionOutcome> {
        let language = language
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.config.default_language)
            .to_string();

        let (file, segments, upload_info, epoch, prev_phase) = {
            let mut state = self.state.lock().await;
            let file = state.file.clone().ok_or(EngineError::NoFile)?;
            let segments = match &state.raw_segments {
                Some(segments) if !segments.is_empty() => segments.clone(),
                Some(_) => return Err(EngineError::NoSegments),
                None => {
                    return Err(EngineError::invalid_phase("transcribe", state.phase));
                }
            };

            state.begin_stage(StageKind::Transcription)?;
            let prev = state.phase;
            state.phase = PipelinePhase::Transcribing;
            // Each run accumulates into its own append-only list.
            state.completed_transcriptions.clear();

            let upload_info = state.reusable_upload_info().cloned();
            if state.upload_info.is_some() && upload_info.is_none() {
                // A handle bound to some other file is worthless; drop it so
                // the stage performs a fresh upload.
                let logger = SessionLogger::new(&self.id, "transcription");
                logger.log_warning("Upload handle does not match the active file; re-uploading");
                state.upload_info = None;
            }

            (file, segments, upload_info, state.epoch(), prev)
        };

        let logger = SessionLogger::new(&self.id, "transcription");
        logger.log_start(&format!(
            "Transcribing {} segments ({})",
            segments.len(),
            language
        ));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let services = Arc::clone(&self.services);
        let call_file = file.clone();
        let call_segments = segments.clone();
        let call_language = language.clone();
        let handle = tokio::spawn(async move {
            services
                .transcribe_video(
                    &call_file,
                    &call_segments,
                    &call_language,
                    tx,
                    upload_info.as_ref(),
                )
                .await
        });

        while let Some(event) = rx.recv().await {
            self.apply_stage_event(epoch, event).await;
        }

        let result = handle
            .await
            .map_err(|e| EngineError::internal(format!("transcription task failed: {}", e)))?;

        let mut state = self.state.lock().await;
        if state.epoch() != epoch {
            logger.log_warning("Discarding transcription result for a superseded session");
            return Err(EngineError::Superseded);
        }
        state.end_stage();

        match result {
            Ok(response) => {
                if let Some(error) = response.error {
                    // Partial failure: completed segments survive alongside
                    // the error.
                    state.phase = prev_phase;
                    logger.log_error(&format!(
                        "Transcription failed after {} segments: {}",
                        state.completed_transcriptions.len(),
                        error
                    ));
                    Ok(TranscriptionOutcome::Failed {
                        completed: state.completed_transcriptions.clone(),
                        error,
                        installation_instructions: response.installation_instructions,
                    })
                } else {
                    state.transcribed_segments = Some(response.segments.clone());
                    // A fresh transcript invalidates any previous filtering.
                    state.filtered_segments = None;
                    state.filter_model = None;
                    state.filter_note = None;
                    state.phase = PipelinePhase::Transcribed;
                    logger.log_completion(&format!(
                        "Transcribed {} segments",
                        response.segments.len()
                    ));
                    Ok(TranscriptionOutcome::Completed {
                        segments: response.segments,
                    })
                }
            }
            Err(e) => {
                state.phase = prev_phase;
                logger.log_error(&format!(
                    "Transcription failed after {} segments: {}",
                    state.completed_transcriptions.len(),
                    e
                ));
                Ok(TranscriptionOutcome::Failed {
                    completed: state.completed_transcriptions.clone(),
                    error: e.to_string(),
                    installation_instructions: None,
                })
            }
        }
    }

    /// Ask the AI filter which transcribed segments to keep.
    pub async fn run_filtering(&self) -> EngineResult<FilterOutcome> {
        let (segments, epoch) = {
            let mut state = self.state.lock().await;
            if state.phase != PipelinePhase::Transcribed {
                return Err(EngineError::invalid_phase("filter", state.phase));
            }
            let segments = state
                .transcribed_segments
                .clone()
                .ok_or_else(|| EngineError::invalid_phase("filter", state.phase))?;

            state.begin_stage(StageKind::Filtering)?;
            state.phase = PipelinePhase::Filtering;
            (segments, state.epoch())
        };

        let logger = SessionLogger::new(&self.id, "ai_filtering");
        logger.log_start(&format!("Filtering {} transcribed segments", segments.len()));

        let result = self.services.filter_transcribed_segments(&segments).await;

        let mut state = self.state.lock().await;
        if state.epoch() != epoch {
            logger.log_warning("Discarding filter result for a superseded session");
            return Err(EngineError::Superseded);
        }
        state.end_stage();

        match result {
            Ok(response) => match response.filtered_segments {
                Some(filtered) => {
                    let note = if let Some(warning) = response.warning {
                        Some(format!("Warning: {}", warning))
                    } else if let Some(error) = response.error {
                        Some(format!("Note: {}", error))
                    } else if filtered.len() == segments.len() {
                        Some(NO_FILTER_EFFECT_NOTE.to_string())
                    } else {
                        None
                    };

                    state.filtered_segments = Some(filtered.clone());
                    state.filter_model = response.model.clone();
                    state.filter_note = note.clone();
                    state.phase = PipelinePhase::Filtered;

                    logger.log_completion(&format!(
                        "Kept {} of {} segments",
                        filtered.len(),
                        segments.len()
                    ));

                    Ok(FilterOutcome {
                        segments: filtered,
                        model: response.model,
                        note,
                    })
                }
                None => {
                    state.phase = PipelinePhase::Transcribed;
                    logger.log_error("Filter returned no segment list");
                    Err(EngineError::filter_failed(
                        "Failed to get filtered segments from the AI. Please try again.",
                    ))
                }
            },
            Err(e) => {
                state.phase = PipelinePhase::Transcribed;
                logger.log_error(&format!("Filtering failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Replace the edited segment list.
    pub async fn update_segments(
        &self,
        segments: Vec<SpeechSegment>,
    ) -> EngineResult<DurationSummary> {
        let mut state = self.state.lock().await;
        editor::apply_manual_edit(&mut state, segments)?;
        Ok(editor::summarize(&state))
    }

    /// Current duration totals.
    pub async fn durations(&self) -> DurationSummary {
        let state = self.state.lock().await;
        editor::summarize(&state)
    }

    /// Export the current best segment list as an xmeml timeline.
    pub async fn export(&self, settings: ExportSettings) -> EngineResult<ExportArtifact> {
        let state = self.state.lock().await;
        let file = state.file.as_ref().ok_or(EngineError::NoFile)?;
        let segments = state
            .best_segments()
            .ok_or_else(|| EngineError::invalid_phase("export", state.phase))?;

        Ok(build_artifact(file, segments, settings))
    }

    /// Run the detection stage against the external service.
    async fn detect(
        &self,
        params: DetectionParams,
        export: Option<ExportSettings>,
    ) -> EngineResult<DetectionSummary> {
        let (file, epoch, prev_phase) = {
            let mut state = self.state.lock().await;
            let file = state.file.clone().ok_or(EngineError::NoFile)?;
            state.begin_stage(StageKind::Detection)?;
            let prev = state.phase;
            state.phase = PipelinePhase::Detecting;
            (file, state.epoch(), prev)
        };

        let logger = SessionLogger::new(&self.id, "silence_detection");
        logger.log_start(&format!(
            "Detecting silence in {} (threshold {})",
            file.name, params.volume_threshold
        ));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let services = Arc::clone(&self.services);
        let call_file = file.clone();
        let handle = tokio::spawn(async move {
            services.remove_silence(&call_file, &params, tx).await
        });

        while let Some(event) = rx.recv().await {
            self.apply_stage_event(epoch, event).await;
        }

        let result = handle
            .await
            .map_err(|e| EngineError::internal(format!("detection task failed: {}", e)))?;

        let mut state = self.state.lock().await;
        if state.epoch() != epoch {
            logger.log_warning("Discarding detection result for a superseded session");
            return Err(EngineError::Superseded);
        }
        state.end_stage();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                state.phase = prev_phase;
                logger.log_error(&format!("Detection failed: {}", e));
                return Err(e.into());
            }
        };

        if let Err(e) = validate_segment_list(&response.segments) {
            state.phase = prev_phase;
            logger.log_error(&format!("Detection returned an invalid segment list: {}", e));
            return Err(e.into());
        }

        state.detection_params = params;
        state.raw_segments = Some(response.segments.clone());
        state.audio_url = Some(response.audio_url.clone());
        if let Some(info) = response.upload_info {
            // The first upload-performing call establishes the handle; later
            // calls without one keep reusing it.
            state.upload_info = Some(info);
        }
        state.phase = PipelinePhase::Detected;

        let durations = editor::summarize(&state);
        let export_artifact =
            export.map(|settings| build_artifact(&file, &response.segments, settings));

        logger.log_completion(&format!(
            "Found {} speech segments",
            response.segments.len()
        ));

        Ok(DetectionSummary {
            segments: response.segments,
            audio_url: response.audio_url,
            durations,
            export: export_artifact,
        })
    }

    /// Apply a streamed progress event to state, then publish it.
    ///
    /// Events carrying a stale epoch belong to an abandoned file selection
    /// and are dropped entirely.
    async fn apply_stage_event(&self, epoch: u64, event: ProgressEvent) {
        let mut state = self.state.lock().await;
        if state.epoch() != epoch {
            return;
        }

        match &event {
            ProgressEvent::UploadProgress { .. } => {
                if state.in_flight() == Some(StageKind::Detection)
                    || state.in_flight() == Some(StageKind::Transcription)
                {
                    state.phase = PipelinePhase::Uploading;
                }
            }
            ProgressEvent::Status { .. } => match state.in_flight() {
                Some(StageKind::Detection) => state.phase = PipelinePhase::Detecting,
                Some(StageKind::Transcription) => state.phase = PipelinePhase::Transcribing,
                Some(StageKind::Filtering) => state.phase = PipelinePhase::Filtering,
                None => {}
            },
            ProgressEvent::SegmentProcessing { .. } => {
                if state.in_flight() == Some(StageKind::Transcription) {
                    state.phase = PipelinePhase::Transcribing;
                }
            }
            ProgressEvent::SegmentComplete {
                segment,
                result,
                current_segment,
                ..
            } => {
                state.completed_transcriptions.push(CompletedTranscription {
                    index: *current_segment,
                    segment: segment.clone(),
                    result: result.clone(),
                });
            }
            ProgressEvent::Complete => {}
        }

        drop(state);
        self.progress.publish(event);
    }
}

/// Build the downloadable timeline artifact for a file and segment list.
fn build_artifact(
    file: &VideoFile,
    segments: &[SpeechSegment],
    settings: ExportSettings,
) -> ExportArtifact {
    let meta = settings.with_source(file.path.clone());
    ExportArtifact {
        file_name: export_file_name(&file.name),
        xml: create_xml_from_segments(segments, &meta),
    }
}
