use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::EventBus;
use crate::outcome::Outcome;

use super::entity::Entity;
use super::event::{DomainEvent, EventRecord};
use super::id::EntityId;

// ============================================================================
// Aggregate Base Type
// ============================================================================
//
// An entity that additionally accumulates the domain events its own
// state-changing methods produce. Business methods append events here; the
// buffer only grows until `clear_events()` and is never implicitly cleared
// by property mutation. The bus keeps its own registered copy, cleared
// independently by dispatch.
//
// ============================================================================

/// Base type for aggregate roots: an entity plus an ordered pending-event
/// buffer.
#[derive(Debug, Clone)]
pub struct AggregateRoot<P> {
    entity: Entity<P>,
    events: Vec<EventRecord>,
}

impl<P> AggregateRoot<P> {
    /// Create a brand-new aggregate with a generated identity and no pending
    /// events. Concrete "create" factories append their created-event next.
    pub fn new(props: P) -> Self {
        Self {
            entity: Entity::new(props),
            events: Vec::new(),
        }
    }

    /// Reconstitute an aggregate from storage: supplied identity, empty
    /// buffer.
    pub fn with_id(props: P, id: EntityId) -> Self {
        Self {
            entity: Entity::with_id(props, id),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &EntityId {
        self.entity.id()
    }

    pub fn props(&self) -> &P {
        self.entity.props()
    }

    pub fn props_mut(&mut self) -> &mut P {
        self.entity.props_mut()
    }

    /// Append a typed event to the buffer and register it with `bus` under
    /// this aggregate's identity.
    pub fn add_event<E: DomainEvent>(&mut self, bus: &EventBus, event: &E) -> Outcome<()> {
        match EventRecord::from_event(event) {
            Ok(record) => self.add_record(bus, record),
            Err(error) => Outcome::fail(error.to_string()),
        }
    }

    /// Append an already-built record to the buffer and register it with
    /// `bus`.
    pub fn add_record(&mut self, bus: &EventBus, record: EventRecord) -> Outcome<()> {
        self.events.push(record.clone());
        bus.register_event(record)
    }

    /// Append and register a batch, stopping at the first registration
    /// failure.
    pub fn add_records(&mut self, bus: &EventBus, records: Vec<EventRecord>) -> Outcome<()> {
        for record in records {
            let outcome = self.add_record(bus, record);
            if outcome.is_failure() {
                return outcome;
            }
        }
        Outcome::ok(())
    }

    /// A copy of the pending buffer; mutating the returned vec never touches
    /// the aggregate.
    pub fn domain_events(&self) -> Vec<EventRecord> {
        self.events.clone()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Empty the local buffer only. Copies already registered with a bus
    /// stay pending there until that bus dispatches them.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Register every buffered event with `bus` again.
    ///
    /// Recovery path for events cleared from a bus out of band (e.g. a
    /// registry reset between a failed dispatch and a retry).
    pub fn mark_for_dispatch(&self, bus: &EventBus) -> Outcome<()> {
        for record in &self.events {
            let outcome = bus.register_event(record.clone());
            if outcome.is_failure() {
                return outcome;
            }
        }
        Outcome::ok(())
    }
}

impl<P: Serialize> AggregateRoot<P> {
    /// Serialize the aggregate's state (identity plus props). Pending events
    /// are dispatch bookkeeping, not state, and are not included.
    pub fn to_value(&self) -> Result<Value> {
        self.entity.to_value()
    }
}

// Identity comparison, same as any entity.
impl<P> PartialEq for AggregateRoot<P> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<P> Eq for AggregateRoot<P> {}

// ============================================================================
// Tests
// ============================================================================
