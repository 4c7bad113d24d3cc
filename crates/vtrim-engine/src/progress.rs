//! Per-session progress event channel.

use tokio::sync::broadcast;
use tracing::debug;

use vtrim_models::ProgressEvent;

/// Channel fanning progress events out to session subscribers.
///
/// Events are applied to pipeline state before being published, so
/// subscribers always observe state-consistent ordering.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressChannel {
    /// Create a new progress channel.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Publish a progress event. Events without subscribers are dropped.
    pub fn publish(&self, event: ProgressEvent) {
        debug!(kind = event.kind().as_str(), "Publishing progress event");
        self.tx.send(event).ok();
    }

    /// Publish a coarse status event.
    pub fn status(&self, status: impl Into<String>, message: impl Into<String>) {
        self.publish(ProgressEvent::status(status, message));
    }

    /// Publish a stage completion event.
    pub fn complete(&self) {
        self.publish(ProgressEvent::complete());
    }
}
