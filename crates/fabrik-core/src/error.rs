//! The single error taxonomy for the engine.
//!
//! Every fallible entry point fails synchronously at the violating call with
//! an [`InvalidOperation`]; nothing is retried by the core. A request that
//! becomes permanently unsatisfiable is *not* an error -- it stays pending,
//! a liveness property left to the caller.

use crate::id::ItemId;

/// Rejection of an operation that would violate an engine invariant.
#[derive(Debug, thiserror::Error)]
pub enum InvalidOperation {
    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("building not found: {0}")]
    BuildingNotFound(String),

    #[error("building {0} does not take sources")]
    SourcesNotAllowed(String),

    #[error("building {building} cannot produce {item}")]
    CannotProduce { building: String, item: String },

    #[error("no configured source of {item} for building {building}")]
    Unsourceable { building: String, item: String },

    #[error("storage underflow: need {needed} of item {item:?}, have {held}")]
    StorageUnderflow {
        item: ItemId,
        needed: u32,
        held: u32,
    },

    #[error("capacity exceeded for item {item:?}: limit {capacity}")]
    CapacityExceeded { item: ItemId, capacity: u32 },

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("latency must be positive")]
    ZeroLatency,

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("unknown policy kind: {0}")]
    UnknownPolicyKind(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("request rejected: building {0} is pending removal")]
    PendingRemoval(String),

    #[error("cannot remove building {0}: outstanding work")]
    RemovalBlocked(String),
}
