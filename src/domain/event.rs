use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::id::EntityId;

// ============================================================================
// Domain Events
// ============================================================================
//
// A domain event is an immutable record of a business-significant fact,
// tagged with a type string and the identity of the aggregate it occurred
// on. Concrete events implement `DomainEvent`; the bus and the aggregate
// buffer carry the uniform `EventRecord` so one queue can hold events of
// any type.
//
// ============================================================================

/// Implemented by concrete domain events.
pub trait DomainEvent: Serialize + Send + Sync {
    /// Dot-namespaced event type, e.g. `"conversation.created"`.
    ///
    /// Handler lookup keys on this string, so it must stay stable.
    fn event_type(&self) -> &'static str;

    /// Identity of the aggregate the fact occurred on.
    fn aggregate_id(&self) -> EntityId;
}

/// The dispatchable form of a domain event.
///
/// Created once, at the moment the triggering business fact occurs; never
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub event_type: String,
    pub aggregate_id: EntityId,
    pub occurred_at: DateTime<Utc>,
    pub payload: Value,
}

impl EventRecord {
    /// Build a record from raw parts, stamping a fresh event id and the
    /// current time.
    pub fn new(event_type: impl Into<String>, aggregate_id: EntityId, payload: Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            aggregate_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Build a record from a typed event, serializing it as the payload.
    pub fn from_event<E: DomainEvent>(event: &E) -> Result<Self> {
        let payload = serialize_payload(event)?;
        Ok(Self::new(event.event_type(), event.aggregate_id(), payload))
    }

    /// Decode the payload back into a typed shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone())
            .with_context(|| format!("failed to decode `{}` payload", self.event_type))
    }
}

/// Serialize an event payload to a JSON value.
pub fn serialize_payload<E: Serialize>(event: &E) -> Result<Value> {
    serde_json::to_value(event).context("failed to serialize event payload")
}

// ============================================================================
// Tests
// ============================================================================
