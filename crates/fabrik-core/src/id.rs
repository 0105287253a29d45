use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a building in the world arena.
    pub struct BuildingId;
}

/// Identifies an item in the catalog. Cheap to copy and compare; two ids are
/// equal exactly when the item names they intern are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a factory type (a named, ordered list of recipes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactoryTypeId(pub u32);

/// Global monotonic order number assigned to every request. Owned by the
/// Simulation's counter and passed explicitly; used for ordering and
/// tie-breaks, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderNo(pub u64);
