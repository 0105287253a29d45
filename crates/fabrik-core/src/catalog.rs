use crate::error::InvalidOperation;
use crate::fixed::Ticks;
use crate::id::{FactoryTypeId, ItemId, RecipeId};
use std::collections::{BTreeMap, HashMap};

/// Reserved path delimiter. Item names must not contain it because item
/// names are embedded in usage-ledger path keys and log lines.
pub const RESERVED_DELIMITER: char = '/';

/// An item definition. Items are interned: equal names yield equal ids.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub name: String,
}

/// A production recipe: one output unit per completion, a set of ingredient
/// quantities, and a latency in ticks. Immutable after catalog build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub output: ItemId,
    pub ingredients: BTreeMap<ItemId, u32>,
    pub latency: Ticks,
}

/// A named, ordered list of recipes a factory can run.
#[derive(Debug, Clone)]
pub struct FactoryType {
    pub name: String,
    pub recipes: Vec<RecipeId>,
}

fn validate_name(name: &str) -> Result<(), InvalidOperation> {
    if name.is_empty() || name.contains(RESERVED_DELIMITER) {
        return Err(InvalidOperation::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Builder for constructing an immutable [`Catalog`].
/// All validation happens at registration time; `build` only freezes.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    recipes: Vec<Recipe>,
    types: Vec<FactoryType>,
    type_name_to_id: HashMap<String, FactoryTypeId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Re-registering an existing name returns the id it
    /// already interned, so id equality coincides with name equality.
    pub fn register_item(&mut self, name: &str) -> Result<ItemId, InvalidOperation> {
        validate_name(name)?;
        if let Some(id) = self.item_name_to_id.get(name) {
            return Ok(*id);
        }
        let id = ItemId(self.items.len() as u32);
        self.items.push(ItemDef {
            name: name.to_string(),
        });
        self.item_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register a recipe. Ingredient quantities and the latency must be
    /// positive; ingredient ids come from `register_item`, so closure holds
    /// by construction.
    pub fn register_recipe(
        &mut self,
        output: ItemId,
        ingredients: &[(ItemId, u32)],
        latency: Ticks,
    ) -> Result<RecipeId, InvalidOperation> {
        if latency == 0 {
            return Err(InvalidOperation::ZeroLatency);
        }
        let mut map = BTreeMap::new();
        for &(item, qty) in ingredients {
            if qty == 0 {
                return Err(InvalidOperation::ZeroQuantity);
            }
            *map.entry(item).or_insert(0) += qty;
        }
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(Recipe {
            output,
            ingredients: map,
            latency,
        });
        Ok(id)
    }

    /// Register a factory type: a named, ordered recipe list.
    pub fn register_type(
        &mut self,
        name: &str,
        recipes: Vec<RecipeId>,
    ) -> Result<FactoryTypeId, InvalidOperation> {
        validate_name(name)?;
        if self.type_name_to_id.contains_key(name) {
            return Err(InvalidOperation::DuplicateName(name.to_string()));
        }
        let id = FactoryTypeId(self.types.len() as u32);
        self.types.push(FactoryType {
            name: name.to_string(),
            recipes,
        });
        self.type_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Freeze into an immutable catalog.
    pub fn build(self) -> Catalog {
        Catalog {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            recipes: self.recipes,
            types: self.types,
        }
    }
}

/// Immutable catalog of items, recipes, and factory types. Frozen after
/// build; every lookup is read-only.
#[derive(Debug)]
pub struct Catalog {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    recipes: Vec<Recipe>,
    types: Vec<FactoryType>,
}

impl Catalog {
    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Item name for display and log lines. Unknown ids render as "?".
    pub fn item_name(&self, id: ItemId) -> &str {
        self.items
            .get(id.0 as usize)
            .map(|d| d.name.as_str())
            .unwrap_or("?")
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.0 as usize)
    }

    pub fn get_type(&self, id: FactoryTypeId) -> Option<&FactoryType> {
        self.types.get(id.0 as usize)
    }

    /// First recipe of the given factory type whose output is `item`.
    pub fn type_recipe_for(&self, ty: FactoryTypeId, item: ItemId) -> Option<RecipeId> {
        let ty = self.get_type(ty)?;
        ty.recipes
            .iter()
            .copied()
            .find(|&rid| self.get_recipe(rid).is_some_and(|r| r.output == item))
    }

    /// Latency of a recipe; unknown ids count as a single tick so a stale
    /// id can never stall an estimate at zero.
    pub fn latency_of(&self, id: RecipeId) -> Ticks {
        self.get_recipe(id).map(|r| r.latency).unwrap_or(1)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}
