use crate::error::InvalidOperation;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A building's storage ledger.
///
/// Invariants: every present entry has a positive quantity (zero entries are
/// pruned on withdrawal, so absence and zero are indistinguishable), and a
/// quantity can never go negative -- an over-withdrawal fails instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    entries: BTreeMap<ItemId, u32>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held; absent entries count as zero.
    pub fn quantity(&self, item: ItemId) -> u32 {
        self.entries.get(&item).copied().unwrap_or(0)
    }

    /// Present quantity, or `None` when the ledger has no entry.
    pub fn entry(&self, item: ItemId) -> Option<u32> {
        self.entries.get(&item).copied()
    }

    /// Credit the ledger. Depositing zero is a no-op.
    pub fn deposit(&mut self, item: ItemId, qty: u32) {
        if qty > 0 {
            *self.entries.entry(item).or_insert(0) += qty;
        }
    }

    /// Debit the ledger. Fails when the held quantity is insufficient (an
    /// absent entry holds zero); on success a depleted entry is pruned.
    pub fn withdraw(&mut self, item: ItemId, qty: u32) -> Result<(), InvalidOperation> {
        let held = self.quantity(item);
        if held < qty {
            return Err(InvalidOperation::StorageUnderflow {
                item,
                needed: qty,
                held,
            });
        }
        let remaining = held - qty;
        if remaining == 0 {
            self.entries.remove(&item);
        } else {
            self.entries.insert(item, remaining);
        }
        Ok(())
    }

    /// Whether every entry in `needs` is covered by the ledger.
    pub fn covers(&self, needs: &BTreeMap<ItemId, u32>) -> bool {
        needs.iter().all(|(&item, &qty)| self.quantity(item) >= qty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.entries.iter().map(|(&item, &qty)| (item, qty))
    }

    pub fn total(&self) -> u32 {
        self.entries.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
