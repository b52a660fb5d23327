// ============================================================================
// Dispatch Errors
// ============================================================================

/// Failure tags for the bus's mutating operations.
///
/// These only surface on unexpected internal errors (a poisoned lock, a
/// payload that fails to serialize); domain-level handler failures are
/// logged, never raised.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("event registration failed: {0}")]
    RegistrationFailed(String),

    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("unsubscription failed: {0}")]
    UnsubscriptionFailed(String),
}
