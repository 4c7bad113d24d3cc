//! Clients for the external services the pipeline drives.
//!
//! The silence-detection DSP, the speech-to-text engine, and the AI filter
//! model all live behind HTTP endpoints of the media service. This crate
//! owns the wire contracts and exposes them to the orchestrator through the
//! [`StageServices`] trait so the pipeline can be exercised without a
//! network.

pub mod client;
pub mod error;
pub mod progress;
pub mod types;

use async_trait::async_trait;

use vtrim_models::{DetectionParams, SpeechSegment, UploadInfo, VideoFile};

pub use client::{HttpStageServices, MediaServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use progress::{decode_stream, ProgressSink};
pub use types::{
    DetectionResponse, FilterRequest, FilterResponse, HealthResponse, TranscribeRequest,
    TranscriptionResponse,
};

/// The three external stage calls the pipeline sequences.
///
/// Long-running calls stream [`vtrim_models::ProgressEvent`]s through the
/// provided sink; the sink is dropped when the call finishes.
#[async_trait]
pub trait StageServices: Send + Sync {
    /// Detect silence and return the speech segments that remain.
    async fn remove_silence(
        &self,
        file: &VideoFile,
        params: &DetectionParams,
        progress: ProgressSink,
    ) -> ServiceResult<DetectionResponse>;

    /// Transcribe each segment, streaming per-segment progress.
    ///
    /// When `upload_info` is provided the already-uploaded file is referenced
    /// instead of re-uploaded.
    async fn transcribe_video(
        &self,
        file: &VideoFile,
        segments: &[SpeechSegment],
        language: &str,
        progress: ProgressSink,
        upload_info: Option<&UploadInfo>,
    ) -> ServiceResult<TranscriptionResponse>;

    /// Ask the AI filter which transcribed segments to keep.
    async fn filter_transcribed_segments(
        &self,
        segments: &[SpeechSegment],
    ) -> ServiceResult<FilterResponse>;
}
