//! Event delivery and cooperative cancellation shared by every run

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

use super::event::EngineEvent;

/// Sending half of the event stream
///
/// Sends never block and never fail: once the receiver is gone, events are
/// dropped with a debug log.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<EngineEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiver
    pub fn channel() -> (Self, UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            debug!("event receiver closed, dropping event");
        }
    }
}

/// Flag checked by running jobs between steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
