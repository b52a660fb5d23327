use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use futures_util::FutureExt;

use crate::domain::{DomainEvent, EntityId, EventRecord};
use crate::outcome::Outcome;

use super::error::DispatchError;
use super::handler::EventHandler;

// ============================================================================
// Event Bus - Best-Effort In-Process Dispatcher
// ============================================================================
//
// Two maps behind one lock:
// - handlers: event-type string -> subscribers, in subscription order
// - pending:  aggregate identity -> queued events, in registration order
//
// Registration and reads are synchronous and never suspend; the lock is
// never held across an await. Dispatch drains an aggregate's queue, starts
// every handler before awaiting any, logs failures, and always reports
// success once all handlers have settled. Notification is best-effort, not
// transactional delivery.
//
// ============================================================================

/// Tuning knobs for a bus instance.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Log events dispatched with zero subscribers.
    pub log_unhandled: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            log_unhandled: true,
        }
    }
}

#[derive(Default)]
struct BusState {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    pending: HashMap<EntityId, Vec<EventRecord>>,
}

/// In-process event dispatcher.
///
/// Construct one per process (or per test) and pass it where it is needed;
/// there is no global instance.
pub struct EventBus {
    state: Mutex<BusState>,
    config: BusConfig,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            state: Mutex::new(BusState::default()),
            config,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusState>, String> {
        self.state.lock().map_err(|error| error.to_string())
    }

    // Introspection never fails: a poisoned lock still yields the data.
    fn lock_recovered(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `handler` to the event type's subscriber list. Registration
    /// order determines invocation order; duplicates are allowed.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Outcome<()> {
        match self.lock() {
            Ok(mut state) => {
                state
                    .handlers
                    .entry(event_type.into())
                    .or_default()
                    .push(handler);
                Outcome::ok(())
            }
            Err(error) => Outcome::fail(DispatchError::SubscriptionFailed(error).to_string()),
        }
    }

    /// Remove the first subscriber matching `handler` by identity. A no-op
    /// success when the handler or event type is unknown.
    pub fn unsubscribe(&self, event_type: &str, handler: &Arc<dyn EventHandler>) -> Outcome<()> {
        match self.lock() {
            Ok(mut state) => {
                if let Some(handlers) = state.handlers.get_mut(event_type) {
                    if let Some(index) = handlers
                        .iter()
                        .position(|existing| Arc::ptr_eq(existing, handler))
                    {
                        handlers.remove(index);
                    }
                }
                Outcome::ok(())
            }
            Err(error) => Outcome::fail(DispatchError::UnsubscriptionFailed(error).to_string()),
        }
    }

    /// Queue a record under its aggregate's identity, creating the queue if
    /// absent.
    pub fn register_event(&self, record: EventRecord) -> Outcome<()> {
        match self.lock() {
            Ok(mut state) => {
                state
                    .pending
                    .entry(record.aggregate_id.clone())
                    .or_default()
                    .push(record);
                Outcome::ok(())
            }
            Err(error) => Outcome::fail(DispatchError::RegistrationFailed(error).to_string()),
        }
    }

    /// Serialize a typed event and queue it under its aggregate's identity.
    pub fn register<E: DomainEvent>(&self, event: &E) -> Outcome<()> {
        match EventRecord::from_event(event) {
            Ok(record) => self.register_event(record),
            Err(error) => {
                Outcome::fail(DispatchError::RegistrationFailed(error.to_string()).to_string())
            }
        }
    }

    /// Drain the aggregate's pending queue and notify subscribers.
    ///
    /// Events go out in registration order and, per event, handlers in
    /// subscription order. Every handler is started before any result is
    /// awaited; failures and panics are logged and never propagated, so the
    /// call reports success once all handlers have settled. Afterwards the
    /// queue entry is deleted, making a second call on the same identity a
    /// no-op success.
    pub async fn dispatch(&self, aggregate_id: &EntityId) -> Outcome<()> {
        let batch: Vec<(EventRecord, Vec<Arc<dyn EventHandler>>)> = match self.lock() {
            Ok(state) => {
                let Some(events) = state.pending.get(aggregate_id) else {
                    return Outcome::ok(());
                };
                events
                    .iter()
                    .map(|record| {
                        let handlers = state
                            .handlers
                            .get(&record.event_type)
                            .cloned()
                            .unwrap_or_default();
                        (record.clone(), handlers)
                    })
                    .collect()
            }
            Err(error) => {
                return Outcome::fail(DispatchError::DispatchFailed(error).to_string());
            }
        };

        let mut invocations = Vec::new();
        for (record, handlers) in batch {
            if handlers.is_empty() && self.config.log_unhandled {
                tracing::debug!(
                    event_type = %record.event_type,
                    aggregate_id = %record.aggregate_id,
                    "No subscribers for event, consumed without notification"
                );
            }

            for handler in handlers {
                let event = record.clone();
                invocations.push(async move {
                    let settled = AssertUnwindSafe(handler.handle(&event))
                        .catch_unwind()
                        .await;
                    (event, settled)
                });
            }
        }

        for (event, settled) in join_all(invocations).await {
            match settled {
                Ok(outcome) => {
                    if outcome.is_failure() {
                        tracing::warn!(
                            event_type = %event.event_type,
                            aggregate_id = %event.aggregate_id,
                            error = %outcome.error(),
                            "Event handler failed"
                        );
                    }
                }
                Err(_) => {
                    tracing::error!(
                        event_type = %event.event_type,
                        aggregate_id = %event.aggregate_id,
                        "Event handler panicked"
                    );
                }
            }
        }

        // The queue entry is deleted only after every handler has settled.
        match self.lock() {
            Ok(mut state) => {
                state.pending.remove(aggregate_id);
                Outcome::ok(())
            }
            Err(error) => Outcome::fail(DispatchError::DispatchFailed(error).to_string()),
        }
    }

    /// Dispatch every aggregate with pending events.
    ///
    /// The set of identities is snapshotted at call time; queues registered
    /// during the sweep wait for the next call. Individual dispatches run
    /// concurrently with no cross-aggregate ordering.
    pub async fn dispatch_all(&self) -> Outcome<()> {
        let ids: Vec<EntityId> = match self.lock() {
            Ok(state) => state.pending.keys().cloned().collect(),
            Err(error) => {
                return Outcome::fail(DispatchError::DispatchFailed(error).to_string());
            }
        };

        let results = join_all(ids.iter().map(|id| self.dispatch(id))).await;
        Outcome::combine(results).map(|_| ())
    }

    /// Pending events for one aggregate, in registration order.
    pub fn events_for(&self, aggregate_id: &EntityId) -> Vec<EventRecord> {
        self.lock_recovered()
            .pending
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the aggregate has pending events. An absent entry and an
    /// empty one are indistinguishable.
    pub fn has_events(&self, aggregate_id: &EntityId) -> bool {
        !self.events_for(aggregate_id).is_empty()
    }

    /// Pending events across all aggregates.
    pub fn total_event_count(&self) -> usize {
        self.lock_recovered().pending.values().map(Vec::len).sum()
    }

    /// Drop every pending queue. Subscriptions survive.
    pub fn clear_events(&self) {
        self.lock_recovered().pending.clear();
    }

    /// Drop every subscription. Pending queues survive.
    pub fn clear_handlers(&self) {
        self.lock_recovered().handlers.clear();
    }

    /// Number of subscribers for an event type.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.lock_recovered()
            .handlers
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Whether this exact handler is subscribed to the event type.
    pub fn is_subscribed(&self, event_type: &str, handler: &Arc<dyn EventHandler>) -> bool {
        self.lock_recovered()
            .handlers
            .get(event_type)
            .is_some_and(|handlers| {
                handlers
                    .iter()
                    .any(|existing| Arc::ptr_eq(existing, handler))
            })
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_recovered();
        f.debug_struct("EventBus")
            .field("event_types", &state.handlers.len())
            .field("pending_aggregates", &state.pending.len())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::handler_fn;
    use async_trait::async_trait;
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    fn record(event_type: &str, id: &EntityId) -> EventRecord {
        EventRecord::new(event_type, id.clone(), serde_json::Value::Null)
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> Arc<dyn EventHandler> {
        handler_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Outcome::ok(())
        })
    }

    #[tokio::test]
    async fn test_dispatch_invokes_handler_per_event_then_clears_queue() {
        let bus = EventBus::default();
        let id = EntityId::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.confirmed", counting_handler(calls.clone()));
        bus.register_event(record("order.confirmed", &id));
        bus.register_event(record("order.confirmed", &id));
        assert!(bus.has_events(&id));

        let outcome = bus.dispatch(&id).await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!bus.has_events(&id));
    }

    #[tokio::test]
    async fn test_second_dispatch_is_a_noop_success() {
        let bus = EventBus::default();
        let id = EntityId::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.confirmed", counting_handler(calls.clone()));
        bus.register_event(record("order.confirmed", &id));

        assert!(bus.dispatch(&id).await.is_success());
        assert!(bus.dispatch(&id).await.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_affect_siblings_or_outcome() {
        init_tracing();
        let bus = EventBus::default();
        let id = EntityId::new();
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let failing = {
            let failed = failed.clone();
            handler_fn(move |_| {
                failed.fetch_add(1, Ordering::SeqCst);
                Outcome::fail("projection broke")
            })
        };
        bus.subscribe("order.confirmed", failing);
        bus.subscribe("order.confirmed", counting_handler(succeeded.clone()));
        bus.register_event(record("order.confirmed", &id));

        let outcome = bus.dispatch(&id).await;

        assert!(outcome.is_success());
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(succeeded.load(Ordering::SeqCst), 1);
        assert!(!bus.has_events(&id));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        init_tracing();
        let bus = EventBus::default();
        let id = EntityId::new();
        let succeeded = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.confirmed", handler_fn(|_| panic!("handler bug")));
        bus.subscribe("order.confirmed", counting_handler(succeeded.clone()));
        bus.register_event(record("order.confirmed", &id));

        let outcome = bus.dispatch(&id).await;

        assert!(outcome.is_success());
        assert_eq!(succeeded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handlers_fire_in_subscription_order() {
        let bus = EventBus::default();
        let id = EntityId::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = order.clone();
            bus.subscribe(
                "order.confirmed",
                handler_fn(move |_| {
                    order.lock().unwrap().push(label);
                    Outcome::ok(())
                }),
            );
        }
        bus.register_event(record("order.confirmed", &id));

        bus.dispatch(&id).await;

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_events_dispatch_in_registration_order() {
        let bus = EventBus::default();
        let id = EntityId::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for event_type in ["order.created", "order.confirmed", "order.shipped"] {
            let seen = seen.clone();
            bus.subscribe(
                event_type,
                handler_fn(move |event| {
                    seen.lock().unwrap().push(event.event_type.clone());
                    Outcome::ok(())
                }),
            );
            bus.register_event(record(event_type, &id));
        }

        bus.dispatch(&id).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["order.created", "order.confirmed", "order.shipped"]
        );
    }

    #[tokio::test]
    async fn test_events_without_subscribers_are_still_consumed() {
        let bus = EventBus::default();
        let id = EntityId::new();

        bus.register_event(record("order.archived", &id));
        let outcome = bus.dispatch(&id).await;

        assert!(outcome.is_success());
        assert!(!bus.has_events(&id));
    }

    #[tokio::test]
    async fn test_dispatch_all_keeps_aggregates_isolated() {
        let bus = EventBus::default();
        let order_id = EntityId::new();
        let customer_id = EntityId::new();
        let order_calls = Arc::new(AtomicUsize::new(0));
        let customer_calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.created", counting_handler(order_calls.clone()));
        bus.subscribe("customer.registered", counting_handler(customer_calls.clone()));
        bus.register_event(record("order.created", &order_id));
        bus.register_event(record("customer.registered", &customer_id));

        let outcome = bus.dispatch_all().await;

        assert!(outcome.is_success());
        assert_eq!(order_calls.load(Ordering::SeqCst), 1);
        assert_eq!(customer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.total_event_count(), 0);
    }

    #[tokio::test]
    async fn test_async_handlers_all_start_before_any_settles() {
        struct SlowHandler {
            started: Arc<AtomicUsize>,
            finished: Arc<AtomicUsize>,
            peak_in_flight: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl EventHandler for SlowHandler {
            async fn handle(&self, _event: &EventRecord) -> Outcome<()> {
                let started = self.started.fetch_add(1, Ordering::SeqCst) + 1;
                let finished = self.finished.load(Ordering::SeqCst);
                self.peak_in_flight
                    .fetch_max(started - finished, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.finished.fetch_add(1, Ordering::SeqCst);
                Outcome::ok(())
            }
        }

        let bus = EventBus::default();
        let id = EntityId::new();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            bus.subscribe(
                "order.confirmed",
                Arc::new(SlowHandler {
                    started: started.clone(),
                    finished: finished.clone(),
                    peak_in_flight: peak.clone(),
                }),
            );
        }
        bus.register_event(record("order.confirmed", &id));

        bus.dispatch(&id).await;

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        // All three were in flight together before the first sleep resolved.
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_first_match_only() {
        let bus = EventBus::default();
        let handler = counting_handler(Arc::new(AtomicUsize::new(0)));

        bus.subscribe("order.created", handler.clone());
        bus.subscribe("order.created", handler.clone());
        assert_eq!(bus.handler_count("order.created"), 2);

        assert!(bus.unsubscribe("order.created", &handler).is_success());
        assert_eq!(bus.handler_count("order.created"), 1);
        assert!(bus.is_subscribed("order.created", &handler));

        assert!(bus.unsubscribe("order.created", &handler).is_success());
        assert_eq!(bus.handler_count("order.created"), 0);
        assert!(!bus.is_subscribed("order.created", &handler));

        // Unknown event type is a no-op success.
        assert!(bus.unsubscribe("order.unknown", &handler).is_success());
    }

    #[tokio::test]
    async fn test_register_typed_event() {
        #[derive(Serialize)]
        struct OrderCreated {
            order_id: EntityId,
        }

        impl DomainEvent for OrderCreated {
            fn event_type(&self) -> &'static str {
                "order.created"
            }

            fn aggregate_id(&self) -> EntityId {
                self.order_id.clone()
            }
        }

        let bus = EventBus::default();
        let id = EntityId::new();

        let outcome = bus.register(&OrderCreated {
            order_id: id.clone(),
        });

        assert!(outcome.is_success());
        let pending = bus.events_for(&id);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "order.created");
    }

    #[test]
    fn test_introspection_and_resets() {
        let bus = EventBus::default();
        let a = EntityId::new();
        let b = EntityId::new();
        let handler = counting_handler(Arc::new(AtomicUsize::new(0)));

        bus.subscribe("order.created", handler.clone());
        bus.register_event(record("order.created", &a));
        bus.register_event(record("order.created", &a));
        bus.register_event(record("order.created", &b));

        assert_eq!(bus.events_for(&a).len(), 2);
        assert_eq!(bus.total_event_count(), 3);

        bus.clear_events();
        assert_eq!(bus.total_event_count(), 0);
        assert!(!bus.has_events(&a));
        // Subscriptions survive an event reset.
        assert_eq!(bus.handler_count("order.created"), 1);

        bus.clear_handlers();
        assert_eq!(bus.handler_count("order.created"), 0);
    }

    #[test]
    fn test_events_for_returns_a_copy() {
        let bus = EventBus::default();
        let id = EntityId::new();
        bus.register_event(record("order.created", &id));

        let mut pending = bus.events_for(&id);
        pending.clear();

        assert_eq!(bus.events_for(&id).len(), 1);
    }
}
