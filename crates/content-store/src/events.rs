//! Event hub contract and recording implementation
//!
//! The engine emits one lifecycle event per completed write. Payloads are
//! already sanitized before they reach the hub; transporting the event
//! (webhooks, queues) is the host platform's concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;

/// Event emitted after a root entity is created
pub const ENTRY_CREATE: &str = "entry.create";
/// Event emitted after a root entity is updated
pub const ENTRY_UPDATE: &str = "entry.update";
/// Event emitted after a root entity is deleted
pub const ENTRY_DELETE: &str = "entry.delete";

/// A recorded event emission
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub id: Uuid,
    pub name: String,
    pub payload: Value,
    pub emitted_at: DateTime<Utc>,
}

/// Outbound lifecycle-event channel
#[async_trait]
pub trait EventHub: Send + Sync {
    /// Emit an event; payload carries `{model, entry}` with the entry
    /// already stripped of private attributes
    async fn emit(&self, event: &str, payload: Value) -> StoreResult<()>;
}

/// In-memory hub that records every emission for inspection in tests
#[derive(Debug, Default)]
pub struct MemoryEventHub {
    events: std::sync::Mutex<Vec<EmittedEvent>>,
}

impl MemoryEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded emissions, in order
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of recorded emissions, in order
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Drop all recorded emissions
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventHub for MemoryEventHub {
    async fn emit(&self, event: &str, payload: Value) -> StoreResult<()> {
        tracing::debug!(event, "recording event emission");
        self.events.lock().unwrap().push(EmittedEvent {
            id: Uuid::new_v4(),
            name: event.to_string(),
            payload,
            emitted_at: Utc::now(),
        });
        Ok(())
    }
}
