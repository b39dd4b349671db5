//! Domain events emitted while chat turns run.
//!
//! `lifechat serve` and `lifechat chat` attach an activity logger; nothing
//! in the turn loop depends on anyone listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A chat message entered the extraction loop
    TurnStarted {
        message_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// An adapter finished (successfully or not)
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn produced its final reply
    TurnCompleted {
        events: usize,
        feelings: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn ended without a reply
    TurnFailed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Records were written to the journal
    RecordsStored {
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
