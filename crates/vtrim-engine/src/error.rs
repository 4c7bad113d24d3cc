//! Engine error types.

use thiserror::Error;

use vtrim_models::params::ParamsError;
use vtrim_models::{PipelinePhase, SegmentListError};
use vtrim_services::ServiceError;

use crate::session::StageKind;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No video file selected")]
    NoFile,

    #[error("No speech segments available for this stage")]
    NoSegments,

    #[error("A {0} stage is already in flight")]
    StageInFlight(StageKind),

    #[error("Cannot {operation} while the session is {actual}")]
    InvalidPhase {
        operation: &'static str,
        actual: PipelinePhase,
    },

    #[error("Session was superseded while the stage was running")]
    Superseded,

    #[error("No action awaiting confirmation")]
    NothingPending,

    #[error("Invalid detection parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Invalid segment list: {0}")]
    InvalidSegments(#[from] SegmentListError),

    #[error("Filtering failed: {0}")]
    FilterFailed(String),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_phase(operation: &'static str, actual: PipelinePhase) -> Self {
        Self::InvalidPhase { operation, actual }
    }

    pub fn filter_failed(msg: impl Into<String>) -> Self {
        Self::FilterFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error means a conflicting operation is already running.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::StageInFlight(_) | EngineError::InvalidPhase { .. }
        )
    }
}
