// ============================================================================
// Event Dispatch - In-Process Event Bus
// ============================================================================
//
// A constructible dispatcher instance: subscriptions keyed by event-type
// string, pending events batched per aggregate identity, best-effort
// notification on dispatch. No hidden process-wide state; callers own their
// bus and pass it where it is needed.
//
// ============================================================================

pub mod error;
pub mod event_bus;
pub mod handler;

pub use error::DispatchError;
pub use event_bus::{BusConfig, EventBus};
pub use handler::{handler_fn, EventHandler, FnHandler};
