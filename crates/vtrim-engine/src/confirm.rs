//! Confirmation gate for destructive actions.
//!
//! Re-detecting with new parameters or discarding a transcript destroys
//! work the user may still want. Such actions are parked here until the
//! user explicitly confirms or cancels; cancelling leaves all pipeline
//! state untouched.

use vtrim_export::ExportSettings;
use vtrim_models::DetectionParams;

use crate::error::{EngineError, EngineResult};

/// A destructive action awaiting user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Discard the existing transcription (and any filtering built on it)
    Discard,
    /// Discard the transcription, then re-run detection with new parameters,
    /// optionally exporting the fresh timeline as a side effect
    Redetect {
        params: DetectionParams,
        export: Option<ExportSettings>,
    },
}

/// Gate holding at most one pending destructive action.
#[derive(Debug, Clone, Default)]
pub struct ConfirmGate {
    pending: Option<PendingAction>,
}

impl ConfirmGate {
    /// Park an action pending confirmation. A newer request replaces an
    /// older one that was never resolved.
    pub fn request(&mut self, action: PendingAction) {
        self.pending = Some(action);
    }

    /// Consume the pending action after the user confirmed.
    pub fn take_confirmed(&mut self) -> EngineResult<PendingAction> {
        self.pending.take().ok_or(EngineError::NothingPending)
    }

    /// Drop the pending action after the user cancelled.
    pub fn cancel(&mut self) -> EngineResult<()> {
        if self.pending.take().is_none() {
            return Err(EngineError::NothingPending);
        }
        Ok(())
    }

    /// Whether an action is awaiting confirmation.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear any pending action without requiring one.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_confirm_cycle() {
        let mut gate = ConfirmGate::default();
        assert!(!gate.is_pending());

        gate.request(PendingAction::Discard);
        assert!(gate.is_pending());

        let action = gate.take_confirmed().unwrap();
        assert_eq!(action, PendingAction::Discard);
        assert!(!gate.is_pending());
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut gate = ConfirmGate::default();
        gate.request(PendingAction::Discard);
        gate.cancel().unwrap();
        assert!(!gate.is_pending());
        assert!(matches!(
            gate.take_confirmed(),
            Err(EngineError::NothingPending)
        ));
    }

    #[test]
    fn test_confirm_without_request_fails() {
        let mut gate = ConfirmGate::default();
        assert!(matches!(
            gate.take_confirmed(),
            Err(EngineError::NothingPending)
        ));
        assert!(matches!(gate.cancel(), Err(EngineError::NothingPending)));
    }

    #[test]
    fn test_latest_request_wins() {
        let mut gate = ConfirmGate::default();
        gate.request(PendingAction::Discard);
        gate.request(PendingAction::Redetect {
            params: DetectionParams::default(),
            export: None,
        });

        assert!(matches!(
            gate.take_confirmed().unwrap(),
            PendingAction::Redetect { .. }
        ));
    }
}
