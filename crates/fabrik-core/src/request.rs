use crate::catalog::Catalog;
use crate::fixed::Ticks;
use crate::id::{BuildingId, ItemId, OrderNo, RecipeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticks a storage building takes to serve one unit from current stock.
pub const STOCK_SERVICE_LATENCY: Ticks = 1;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Sitting in a producer's pending queue.
    #[default]
    Queued,
    /// Selected as the producer's current request, frozen on a missing
    /// ingredient until a delivery re-satisfies the check.
    Blocked,
    /// All ingredients present; the countdown is running.
    Working,
}

/// A demand for exactly one unit of an item, owned by exactly one producer
/// at a time and mutated only by that producer.
///
/// `recipe` is `None` when the producer serves the unit from buffered stock
/// (storage buildings) rather than by running a recipe. A `None` delivery
/// target marks a user-originated request: the finished unit stays in the
/// producer's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    order: OrderNo,
    item: ItemId,
    recipe: Option<RecipeId>,
    producer: BuildingId,
    target: Option<BuildingId>,
    pub(crate) remaining: Ticks,
    pub(crate) status: RequestStatus,
}

impl Request {
    pub fn new(
        order: OrderNo,
        item: ItemId,
        recipe: Option<RecipeId>,
        producer: BuildingId,
        target: Option<BuildingId>,
        remaining: Ticks,
    ) -> Self {
        Self {
            order,
            item,
            recipe,
            producer,
            target,
            remaining,
            status: RequestStatus::Queued,
        }
    }

    pub fn order(&self) -> OrderNo {
        self.order
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn recipe(&self) -> Option<RecipeId> {
        self.recipe
    }

    pub fn producer(&self) -> BuildingId {
        self.producer
    }

    pub fn target(&self) -> Option<BuildingId> {
        self.target
    }

    pub fn remaining(&self) -> Ticks {
        self.remaining
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn is_user_originated(&self) -> bool {
        self.target.is_none()
    }

    /// What the producer must hold before the countdown may run: the
    /// recipe's ingredients, or one unit of the item itself when serving
    /// from stock.
    pub fn needs(&self, catalog: &Catalog) -> BTreeMap<ItemId, u32> {
        match self.recipe.and_then(|rid| catalog.get_recipe(rid)) {
            Some(recipe) => recipe.ingredients.clone(),
            None => {
                let mut needs = BTreeMap::new();
                needs.insert(self.item, 1);
                needs
            }
        }
    }
}
