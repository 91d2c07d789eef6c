//! Audit events for permission changes.
//!
//! Every mutation of a permission list (grant, revoke, role swap, inheritance
//! transitions, copy-from-project) publishes a [`DomainEvent`] on a broadcast
//! bus so that audit-log and notification consumers can react without the
//! engine knowing about them. Publishing is fire-and-forget; a bus with no
//! subscribers is fine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub severity: Severity,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(
        name: impl Into<String>,
        actor_id: Option<Uuid>,
        subject_id: Option<Uuid>,
        severity: Severity,
        payload: T,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            occurred_at: Utc::now(),
            actor_id,
            subject_id,
            severity,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

/// Serialize and publish, swallowing both serialization failures and the
/// no-subscriber send error; audit fan-out must never fail a mutation.
pub fn publish<T: Serialize>(bus: &EventBus, event: &DomainEvent<T>) {
    match serde_json::to_value(event) {
        Ok(value) => {
            let _ = bus.send(value);
        }
        Err(err) => {
            tracing::warn!(event = %event.name, error = %err, "failed to serialize audit event");
        }
    }
}
