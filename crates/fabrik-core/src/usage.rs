//! Scratch bookkeeping for one recursive source-selection call.
//!
//! The estimator walks overlapping sourcing chains, and two sibling
//! ingredient branches of the same call must not both claim the same
//! physical unit of storage or the same in-flight completion. The ledger
//! records both kinds of claim, keyed by a canonical path of visited
//! building identities, so claims made along one path never shade a
//! different path.
//!
//! A ledger lives for exactly one `select_source` call: created fresh,
//! discarded after, never persisted on any building and never shared across
//! ticks.

use crate::catalog::RESERVED_DELIMITER;
use crate::id::{BuildingId, ItemId, OrderNo};
use serde::{Deserialize, Serialize};
use slotmap::Key;
use std::collections::{BTreeMap, BTreeSet};

/// Canonical key for a path of visited buildings: arena key values joined by
/// the reserved delimiter. Deterministic and serializable, unlike an
/// identity hash.
pub fn path_key(path: &[BuildingId]) -> String {
    let mut key = String::new();
    for (i, b) in path.iter().enumerate() {
        if i > 0 {
            key.push(RESERVED_DELIMITER);
        }
        key.push_str(&b.data().as_ffi().to_string());
    }
    key
}

/// Per-call claim ledger for the recursive latency estimator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLedger {
    /// Storage units already claimed, keyed by (item, canonical path).
    storage_used: BTreeMap<(ItemId, String), u32>,
    /// In-flight completions already counted, keyed by (building key,
    /// order number).
    counted: BTreeSet<(u64, u64)>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `qty` more units of `item` as claimed along `path`.
    /// Repeated claims accumulate.
    pub fn add_storage_used(&mut self, item: ItemId, path: &[BuildingId], qty: u32) {
        *self
            .storage_used
            .entry((item, path_key(path)))
            .or_insert(0) += qty;
    }

    /// Units of `item` already claimed along exactly `path`.
    pub fn storage_used(&self, item: ItemId, path: &[BuildingId]) -> u32 {
        self.storage_used
            .get(&(item, path_key(path)))
            .copied()
            .unwrap_or(0)
    }

    /// Drop every storage claim whose path matches `path` exactly, for any
    /// item. Claims along other paths are untouched.
    pub fn clear_reservations(&mut self, path: &[BuildingId]) {
        let key = path_key(path);
        self.storage_used.retain(|(_, p), _| *p != key);
    }

    /// Mark an in-flight completion as counted. Returns `false` when a
    /// sibling branch already counted it.
    pub fn count_in_progress(&mut self, building: BuildingId, order: OrderNo) -> bool {
        self.counted.insert((building.data().as_ffi(), order.0))
    }

    pub fn is_counted(&self, building: BuildingId, order: OrderNo) -> bool {
        self.counted.contains(&(building.data().as_ffi(), order.0))
    }
}
