// ============================================================================
// Outcome Types - Explicit Success/Failure and Presence/Absence
// ============================================================================
//
// Foundational sum types used by every other module to report failures and
// absent values without throwing. Domain failures travel as `Outcome::fail`
// and are propagated by early return; unwrapping the wrong branch is a
// programmer error and fails fast.
//
// ============================================================================

pub mod option;
pub mod pagination;
pub mod result;

pub use option::Maybe;
pub use pagination::{create_paginated_result, PaginatedResult, PaginationParams, DEFAULT_PAGINATION};
pub use result::Outcome;
