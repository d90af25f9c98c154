//! Run lifecycle notifications
//!
//! Events are broadcast to any number of subscribers. Publishing never blocks
//! and never fails the run; with no subscribers the event is dropped.

use tokio::sync::broadcast;
use tracing::trace;

use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleDescriptor};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub enum OrchestratorEvent {
    ModuleRegistered(ModuleDescriptor),
    ExecutionCompleted(ExecutionResult),
    ExecutionFailed {
        strategy: String,
        error: OrchestratorError,
    },
}

impl OrchestratorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorEvent::ModuleRegistered(_) => "moduleRegistered",
            OrchestratorEvent::ExecutionCompleted(_) => "executionCompleted",
            OrchestratorEvent::ExecutionFailed { .. } => "executionFailed",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: OrchestratorEvent) {
        let kind = event.kind();
        if self.sender.send(event).is_err() {
            trace!("No subscribers for {} event", kind);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
