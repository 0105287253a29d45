//! Buildings: the closed variant set behind one capability contract.
//!
//! Every building shares the same bookkeeping -- a storage ledger, a pending
//! request queue, at most one current request, a pending-removal flag -- by
//! composition in [`Building`]. What differs per variant lives in
//! [`BuildingKind`] and is dispatched by enum match, never trait objects.
//! The per-tick production algorithm itself is driven by the Simulation,
//! which owns the cross-building concerns (source selection, deliveries).

use crate::catalog::Catalog;
use crate::drone::DronePool;
use crate::error::InvalidOperation;
use crate::fixed::{Fixed64, Ticks};
use crate::id::{BuildingId, FactoryTypeId, ItemId, RecipeId};
use crate::policy::RequestPolicy;
use crate::request::{Request, STOCK_SERVICE_LATENCY};
use crate::route::Coord;
use crate::source_policy::SourcePolicy;
use crate::storage::Storage;
use crate::waste::WasteState;
use std::collections::VecDeque;

/// Variant-specific state and behavior.
#[derive(Debug, Clone)]
pub enum BuildingKind {
    /// Produces a single fixed recipe; has no sources.
    Mine { recipe: RecipeId },
    /// Runs any recipe of its factory type, sourcing missing ingredients
    /// from its source list.
    Factory { ty: FactoryTypeId },
    /// Buffers one item type. Deliveries land in `arriving` and promote
    /// into the ledger ("current" stock) at the next tick boundary.
    /// `requested` counts replenishment units still in flight; `priority`
    /// is the fill-target fraction of `capacity`.
    Store {
        item: ItemId,
        capacity: u32,
        priority: Fixed64,
        arriving: u32,
        requested: u32,
    },
    /// Accepts and destroys configured waste types.
    WasteDisposal(WasteState),
    /// Owns a bounded drone fleet with an operating radius (Manhattan).
    DronePort { pool: DronePool, radius: u32 },
}

/// A building: shared ledger/queue bookkeeping plus its variant.
#[derive(Debug)]
pub struct Building {
    pub(crate) name: String,
    pub(crate) pos: Coord,
    pub(crate) sources: Vec<BuildingId>,
    pub(crate) storage: Storage,
    pub(crate) pending: VecDeque<Request>,
    pub(crate) current: Option<Request>,
    pub(crate) pending_removal: bool,
    pub(crate) request_policy: RequestPolicy,
    pub(crate) source_policy: SourcePolicy,
    pub(crate) kind: BuildingKind,
}

impl Building {
    pub(crate) fn new(name: String, pos: Coord, kind: BuildingKind) -> Self {
        Self {
            name,
            pos,
            sources: Vec::new(),
            storage: Storage::new(),
            pending: VecDeque::new(),
            current: None,
            pending_removal: false,
            request_policy: RequestPolicy::default(),
            source_policy: SourcePolicy::default(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pos(&self) -> Coord {
        self.pos
    }

    pub fn sources(&self) -> &[BuildingId] {
        &self.sources
    }

    pub fn kind(&self) -> &BuildingKind {
        &self.kind
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn request_policy(&self) -> RequestPolicy {
        self.request_policy
    }

    pub fn source_policy(&self) -> SourcePolicy {
        self.source_policy
    }

    // -----------------------------------------------------------------------
    // Storage ledger operations
    // -----------------------------------------------------------------------

    /// Stored quantity, or `None` when the ledger has no entry for the item.
    pub fn storage_of(&self, item: ItemId) -> Option<u32> {
        self.storage.entry(item)
    }

    /// Credit the ledger. The quantity must be positive.
    pub fn add_to_storage(&mut self, item: ItemId, qty: u32) -> Result<(), InvalidOperation> {
        if qty == 0 {
            return Err(InvalidOperation::ZeroQuantity);
        }
        self.storage.deposit(item, qty);
        Ok(())
    }

    /// Debit the ledger. Fails when the entry is absent or insufficient.
    pub fn take_from_storage(&mut self, item: ItemId, qty: u32) -> Result<(), InvalidOperation> {
        self.storage.withdraw(item, qty)
    }

    // -----------------------------------------------------------------------
    // Request queue
    // -----------------------------------------------------------------------

    /// Enqueue a request. Rejected once the building is pending removal.
    pub fn add_request(&mut self, request: Request) -> Result<(), InvalidOperation> {
        if self.pending_removal {
            return Err(InvalidOperation::PendingRemoval(self.name.clone()));
        }
        self.pending.push_back(request);
        Ok(())
    }

    pub fn pending_requests(&self) -> impl Iterator<Item = &Request> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn current_request(&self) -> Option<&Request> {
        self.current.as_ref()
    }

    // -----------------------------------------------------------------------
    // Capability queries
    // -----------------------------------------------------------------------

    /// Whether this building can ever produce (or serve) the item.
    pub fn can_produce(&self, item: ItemId, catalog: &Catalog) -> bool {
        match &self.kind {
            BuildingKind::Mine { recipe } => catalog
                .get_recipe(*recipe)
                .is_some_and(|r| r.output == item),
            BuildingKind::Factory { ty } => catalog.type_recipe_for(*ty, item).is_some(),
            BuildingKind::Store { item: buffered, .. } => *buffered == item,
            BuildingKind::WasteDisposal(_) | BuildingKind::DronePort { .. } => false,
        }
    }

    /// The recipe this building would run to produce `item`. `None` for a
    /// store (it serves from stock) and for items it cannot produce.
    pub fn recipe_for(&self, item: ItemId, catalog: &Catalog) -> Option<RecipeId> {
        match &self.kind {
            BuildingKind::Mine { recipe } => catalog
                .get_recipe(*recipe)
                .filter(|r| r.output == item)
                .map(|_| *recipe),
            BuildingKind::Factory { ty } => catalog.type_recipe_for(*ty, item),
            _ => None,
        }
    }

    /// Ticks one unit of `item` takes here once its needs are met.
    pub fn service_latency(&self, item: ItemId, catalog: &Catalog) -> Ticks {
        self.recipe_for(item, catalog)
            .map(|rid| catalog.latency_of(rid))
            .unwrap_or(STOCK_SERVICE_LATENCY)
    }

    /// Whether new work may still be routed here.
    pub fn can_accept_work(&self) -> bool {
        !self.pending_removal
    }

    // -----------------------------------------------------------------------
    // Removal lifecycle
    // -----------------------------------------------------------------------

    /// No pending and no current request; waste disposal additionally
    /// requires no batch mid-processing, and a store requires no arrivals
    /// still staged for the next tick boundary.
    pub fn is_finished(&self) -> bool {
        let idle = self.pending.is_empty() && self.current.is_none();
        match &self.kind {
            BuildingKind::WasteDisposal(ws) => idle && ws.is_idle(),
            BuildingKind::Store { arriving, .. } => idle && *arriving == 0,
            _ => idle,
        }
    }

    /// Flag for removal. Succeeds only with zero outstanding work; once
    /// flagged, new requests are rejected.
    pub fn mark_for_removal(&mut self) -> Result<(), InvalidOperation> {
        if !self.is_finished() {
            return Err(InvalidOperation::RemovalBlocked(self.name.clone()));
        }
        self.pending_removal = true;
        Ok(())
    }

    pub fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }
}
