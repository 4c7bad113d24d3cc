//! Pipeline orchestration engine.
//!
//! Sequences upload, silence detection, transcription, and AI filtering
//! against the external media services, holding the canonical pipeline
//! state for each editing session and streaming typed progress events to
//! subscribers.

pub mod config;
pub mod confirm;
pub mod editor;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod progress;
pub mod session;

pub use config::EngineConfig;
pub use confirm::{ConfirmGate, PendingAction};
pub use editor::DurationSummary;
pub use error::{EngineError, EngineResult};
pub use logging::SessionLogger;
pub use orchestrator::{
    DetectionOutcome, DetectionSummary, DiscardOutcome, FilterOutcome, PendingOutcome,
    PipelineSession, TranscriptionOutcome, NO_FILTER_EFFECT_NOTE,
};
pub use progress::ProgressChannel;
pub use session::{CompletedTranscription, PipelineSnapshot, PipelineState, StageKind};
