//! Media service request/response types.

use serde::{Deserialize, Serialize};

use vtrim_models::{InstallationInstructions, SpeechSegment, UploadInfo};

/// Result of a silence-detection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    /// Speech segments left after removing silence, ordered and non-overlapping
    pub segments: Vec<SpeechSegment>,

    /// URL of the extracted audio for preview playback
    pub audio_url: String,

    /// Upload handle, present when this call performed the upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_info: Option<UploadInfo>,
}

/// Result of a transcription call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Segments annotated with transcript text
    #[serde(default)]
    pub segments: Vec<SpeechSegment>,

    /// Error message when the run failed (possibly after partial progress)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Present when the service environment lacks a required tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_instructions: Option<InstallationInstructions>,
}

/// Result of an AI filter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    /// Segments the model decided to keep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_segments: Option<Vec<SpeechSegment>>,

    /// Model identifier that produced the filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Non-fatal warning from the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Error note from the service (segments may still be present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON transcription request body used when the file is already uploaded.
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeRequest<'a> {
    /// Path of the previously uploaded file on the media service
    pub file_path: &'a str,
    /// Media-service session the upload belongs to
    pub session_id: &'a str,
    /// Segments to transcribe
    pub segments: &'a [SpeechSegment],
    /// Transcription language
    pub language: &'a str,
}

/// Filter request body.
#[derive(Debug, Clone, Serialize)]
pub struct FilterRequest<'a> {
    /// Transcribed segments to filter
    pub segments: &'a [SpeechSegment],
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
