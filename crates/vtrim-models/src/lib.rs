//! Shared data models for the VTrim backend.
//!
//! This crate provides Serde-serializable types for:
//! - Speech segments and their transcription/filter annotations
//! - Silence-detection parameters
//! - Selected-file identity and upload handles
//! - Pipeline phases
//! - Progress event schemas streamed by long-running stages

pub mod install;
pub mod params;
pub mod phase;
pub mod progress;
pub mod segment;
pub mod session;
pub mod upload;

// Re-export common types
pub use install::InstallationInstructions;
pub use params::DetectionParams;
pub use phase::PipelinePhase;
pub use progress::{ProgressEvent, ProgressEventKind, SegmentWindow};
pub use segment::{
    original_duration, total_segment_duration, validate_segment_list, FilterAnnotation,
    FilterDisposition, FilterOrigin, SegmentListError, SpeechSegment,
};
pub use session::SessionId;
pub use upload::{FileIdentity, UploadInfo, VideoFile};
