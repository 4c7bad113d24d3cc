//! Session lifecycle and stage-trigger handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use vtrim_engine::{
    DetectionOutcome, DiscardOutcome, DurationSummary, FilterOutcome, PendingOutcome,
    PipelineSession, PipelineSnapshot, TranscriptionOutcome,
};
use vtrim_export::ExportSettings;
use vtrim_models::{DetectionParams, SpeechSegment, VideoFile};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// File selection payload.
#[derive(Debug, Deserialize, Validate)]
pub struct FileRequest {
    /// Original file name
    #[validate(length(min = 1, message = "file_name must not be empty"))]
    pub file_name: String,

    /// Path of the file on storage reachable by the backend
    #[validate(length(min = 1, message = "file_path must not be empty"))]
    pub file_path: String,

    /// File size in bytes
    pub file_size: u64,
}

impl FileRequest {
    fn into_video_file(self) -> VideoFile {
        VideoFile::new(self.file_path, self.file_name, self.file_size)
    }
}

/// Detection request payload.
#[derive(Debug, Default, Deserialize)]
pub struct DetectRequest {
    /// Detection parameters; omitted knobs use defaults
    #[serde(default)]
    pub params: DetectionParams,

    /// When present, export the fresh timeline right after detection
    #[serde(default)]
    pub export: Option<ExportSettings>,
}

/// Transcription request payload.
#[derive(Debug, Default, Deserialize)]
pub struct TranscribeRequest {
    /// Transcription language; server default when omitted
    #[serde(default)]
    pub language: Option<String>,
}

/// Segment editor payload.
#[derive(Debug, Deserialize)]
pub struct UpdateSegmentsRequest {
    pub segments: Vec<SpeechSegment>,
}

async fn lookup(state: &AppState, session_id: &str) -> ApiResult<Arc<PipelineSession>> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No session {}", session_id)))
}

/// Create a session for a newly selected file.
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<FileRequest>,
) -> ApiResult<(StatusCode, Json<PipelineSnapshot>)> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let session = state.create_session().await;
    session.select_file(payload.into_video_file()).await;

    Ok((StatusCode::CREATED, Json(session.snapshot().await)))
}

/// Current pipeline state snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<PipelineSnapshot>> {
    let session = lookup(&state, &session_id).await?;
    Ok(Json(session.snapshot().await))
}

/// Drop a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .remove(&session_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No session {}", session_id)))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Select a different file in an existing session, resetting all state.
pub async fn select_file(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<FileRequest>,
) -> ApiResult<Json<PipelineSnapshot>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let session = lookup(&state, &session_id).await?;
    session.select_file(payload.into_video_file()).await;
    Ok(Json(session.snapshot().await))
}

/// Run silence detection (or park it behind confirmation).
pub async fn detect(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<DetectRequest>,
) -> ApiResult<Json<DetectionOutcome>> {
    let session = lookup(&state, &session_id).await?;
    let outcome = session
        .apply_detection_params(payload.params, payload.export)
        .await?;
    Ok(Json(outcome))
}

/// Confirm the pending destructive action.
pub async fn confirm_detection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<PendingOutcome>> {
    let session = lookup(&state, &session_id).await?;
    Ok(Json(session.confirm_pending().await?))
}

/// Cancel the pending destructive action.
pub async fn cancel_detection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let session = lookup(&state, &session_id).await?;
    session.cancel_pending().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Transcribe the detected segments.
pub async fn transcribe(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<TranscribeRequest>,
) -> ApiResult<Json<TranscriptionOutcome>> {
    let session = lookup(&state, &session_id).await?;
    let outcome = session
        .run_transcription(payload.language.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// Run AI filtering over the transcript.
pub async fn filter(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<FilterOutcome>> {
    let session = lookup(&state, &session_id).await?;
    Ok(Json(session.run_filtering().await?))
}

/// Request discarding the transcription output.
pub async fn discard_transcription(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DiscardOutcome>> {
    let session = lookup(&state, &session_id).await?;
    Ok(Json(session.discard_transcription().await?))
}

/// Replace the edited segment list.
pub async fn update_segments(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<UpdateSegmentsRequest>,
) -> ApiResult<Json<DurationSummary>> {
    let session = lookup(&state, &session_id).await?;
    Ok(Json(session.update_segments(payload.segments).await?))
}

/// Download the current timeline as an xmeml document.
pub async fn export(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(settings): Query<ExportSettings>,
) -> ApiResult<impl IntoResponse> {
    let session = lookup(&state, &session_id).await?;
    let artifact = session.export(settings).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.xml,
    ))
}
