//! In-process domain-event dispatch kernel.
//!
//! Building blocks for domain-driven applications: explicit outcome types
//! ([`Outcome`], [`Maybe`]), identity and entity/aggregate base types that
//! accumulate domain events, a change-tracking [`WatchedList`], and the
//! [`EventBus`] that batches events per aggregate identity and notifies
//! subscribed handlers best-effort.
//!
//! Everything is in-memory and single-process: persistence, transport, and
//! the business aggregates themselves are consumers of this crate, not part
//! of it.
//!
//! ```no_run
//! use domain_kernel::{handler_fn, EntityId, EventBus, EventRecord, Outcome};
//!
//! let bus = EventBus::default();
//! bus.subscribe(
//!     "conversation.created",
//!     handler_fn(|event| {
//!         println!("notified: {}", event.event_type);
//!         Outcome::ok(())
//!     }),
//! );
//!
//! let id = EntityId::new();
//! bus.register_event(EventRecord::new(
//!     "conversation.created",
//!     id.clone(),
//!     serde_json::json!({ "title": "hello" }),
//! ));
//!
//! // After the aggregate is persisted:
//! tokio::runtime::Runtime::new().unwrap().block_on(async {
//!     bus.dispatch(&id).await;
//! });
//! ```

pub mod dispatch;
pub mod domain;
pub mod outcome;

pub use dispatch::{handler_fn, BusConfig, DispatchError, EventBus, EventHandler, FnHandler};
pub use domain::{AggregateRoot, DomainEvent, Entity, EntityId, EventRecord, WatchedList};
pub use outcome::{
    create_paginated_result, Maybe, Outcome, PaginatedResult, PaginationParams, DEFAULT_PAGINATION,
};
