use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::EventRecord;
use crate::outcome::Outcome;

// ============================================================================
// Event Handlers
// ============================================================================

/// Subscriber invoked with each dispatched event of its type.
///
/// Handlers report domain failures as `Outcome::fail`; the bus logs them and
/// carries on. Notification is best-effort, not transactional delivery.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &EventRecord) -> Outcome<()>;
}

/// Adapter turning a synchronous closure into an `EventHandler`.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&EventRecord) -> Outcome<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&EventRecord) -> Outcome<()> + Send + Sync,
{
    async fn handle(&self, event: &EventRecord) -> Outcome<()> {
        (self.f)(event)
    }
}

/// Wrap a synchronous closure as a subscribable handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&EventRecord) -> Outcome<()> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new(f))
}
