//! Event bus for collection, item and share changes
//!
//! Services emit after a write commits and log the change themselves.
//! Subscribers (a long-running boundary layer, tests) get the same changes
//! as values.

use tokio::sync::broadcast;
use tracing::trace;

/// Events emitted by services
#[derive(Debug, Clone, PartialEq)]
pub enum HammerEvent {
    UserRegistered {
        id: String,
        username: String,
    },

    CollectionCreated {
        id: String,
        name: String,
        owner_id: String,
    },
    CollectionUpdated {
        id: String,
        visibility: String,
    },
    CollectionDeleted {
        id: String,
    },

    ItemCreated {
        id: String,
        collection_id: String,
        owner_id: String,
    },
    ItemUpdated {
        id: String,
    },
    ItemDeleted {
        id: String,
    },

    ShareGranted {
        collection_id: String,
        grantee_id: String,
        level: String,
        /// false when an existing grant's level was overwritten
        created: bool,
    },
    ShareRevoked {
        collection_id: String,
        grantee_id: String,
    },
}

/// Broadcast channel shared by all services
pub struct EventBus {
    sender: broadcast::Sender<HammerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: HammerEvent) {
        trace!(event = ?event, "Emitting event");
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HammerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
