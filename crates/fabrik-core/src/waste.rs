use crate::error::InvalidOperation;
use crate::fixed::Ticks;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-waste-type intake limits and processing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteConfig {
    /// Maximum units of this type on site, stored plus reserved.
    pub capacity: u32,
    /// Units destroyed per processing batch.
    pub rate: u32,
    /// Ticks one batch takes.
    pub processing_ticks: Ticks,
}

/// A batch of waste mid-destruction. Units in a batch have already left the
/// ledger; they no longer count against intake capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteBatch {
    pub item: ItemId,
    pub quantity: u32,
    pub remaining: Ticks,
}

/// Waste-disposal bookkeeping: per-type configuration, the reservation
/// ledger for incoming waste, and at most one batch mid-processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteState {
    config: BTreeMap<ItemId, WasteConfig>,
    reserved: BTreeMap<ItemId, u32>,
    pub(crate) processing: Option<WasteBatch>,
}

impl WasteState {
    pub fn new(config: BTreeMap<ItemId, WasteConfig>) -> Self {
        Self {
            config,
            reserved: BTreeMap::new(),
            processing: None,
        }
    }

    pub fn accepts(&self, item: ItemId) -> bool {
        self.config.contains_key(&item)
    }

    pub fn config_of(&self, item: ItemId) -> Option<&WasteConfig> {
        self.config.get(&item)
    }

    pub fn configured_types(&self) -> impl Iterator<Item = (ItemId, &WasteConfig)> + '_ {
        self.config.iter().map(|(&item, cfg)| (item, cfg))
    }

    pub fn reserved(&self, item: ItemId) -> u32 {
        self.reserved.get(&item).copied().unwrap_or(0)
    }

    /// Intake headroom for `item` given the units currently stored on site.
    pub fn free_capacity(&self, item: ItemId, stored: u32) -> u32 {
        let Some(cfg) = self.config.get(&item) else {
            return 0;
        };
        cfg.capacity
            .saturating_sub(stored)
            .saturating_sub(self.reserved(item))
    }

    /// Reserve intake capacity for waste that is on its way. Fails when the
    /// type is not handled here or the reservation would exceed capacity.
    pub fn reserve(&mut self, item: ItemId, qty: u32, stored: u32) -> Result<(), InvalidOperation> {
        let Some(cfg) = self.config.get(&item) else {
            return Err(InvalidOperation::CapacityExceeded { item, capacity: 0 });
        };
        if self.free_capacity(item, stored) < qty {
            return Err(InvalidOperation::CapacityExceeded {
                item,
                capacity: cfg.capacity,
            });
        }
        *self.reserved.entry(item).or_insert(0) += qty;
        Ok(())
    }

    /// Release a matching reservation when the waste lands. Saturating: a
    /// deposit without a reservation leaves the ledger at zero.
    pub fn release(&mut self, item: ItemId, qty: u32) {
        if let Some(r) = self.reserved.get_mut(&item) {
            *r = r.saturating_sub(qty);
            if *r == 0 {
                self.reserved.remove(&item);
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.processing.is_none()
    }

    /// Begin destroying a batch. Caller has already debited the ledger.
    pub fn start_batch(&mut self, item: ItemId, quantity: u32) {
        let ticks = self
            .config
            .get(&item)
            .map(|c| c.processing_ticks.max(1))
            .unwrap_or(1);
        self.processing = Some(WasteBatch {
            item,
            quantity,
            remaining: ticks,
        });
    }

    /// Advance the in-progress batch one tick; returns the batch when it
    /// finishes this tick.
    pub fn tick_batch(&mut self) -> Option<WasteBatch> {
        let batch = self.processing.as_mut()?;
        batch.remaining = batch.remaining.saturating_sub(1);
        if batch.remaining == 0 {
            self.processing.take()
        } else {
            None
        }
    }
}
