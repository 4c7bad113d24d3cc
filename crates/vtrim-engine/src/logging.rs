//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for stage execution with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use vtrim_models::SessionId;

/// Session logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    stage: String,
}

impl SessionLogger {
    /// Create a new logger for a session and stage.
    ///
    /// # Arguments
    /// * `session_id` - The editing session
    /// * `stage` - The stage name (e.g. "silence_detection", "transcription")
    pub fn new(session_id: &SessionId, stage: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Log the start of a stage.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    /// Log a warning.
    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    /// Log an error.
    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    /// Create a tracing span for this stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            session_id = %self.session_id,
            stage = %self.stage
        )
    }
}
