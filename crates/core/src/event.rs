//! Domain event system: decoupled observation of the request pipeline.
//!
//! Events are published when something interesting happens in the system.
//! Other components can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The intent router classified a message
    DecisionMade {
        session: String,
        action: String,
        save_intent: bool,
        fallback: bool,
        timestamp: DateTime<Utc>,
    },

    /// One retrieval provider was attempted
    ProviderAttempted {
        provider: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The retrieval cascade committed to a record
    RetrievalResolved {
        source: String,
        confidence: f32,
        timestamp: DateTime<Utc>,
    },

    /// A briefing was rewritten for a session
    CompactionCompleted {
        session: String,
        turns: usize,
        timestamp: DateTime<Utc>,
    },

    /// Compaction failed and was discarded
    CompactionFailed {
        session: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The orchestrator produced a response
    ResponseGenerated {
        session: String,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
