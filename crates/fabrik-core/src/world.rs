use crate::building::{Building, BuildingKind};
use crate::catalog::Catalog;
use crate::drone::DronePool;
use crate::error::InvalidOperation;
use crate::fixed::Fixed64;
use crate::id::{BuildingId, FactoryTypeId, ItemId, RecipeId};
use crate::route::Coord;
use crate::waste::{WasteConfig, WasteState};
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};

/// The frozen building graph the simulation runs over: the arena of
/// buildings, a name index, and the fixed registration order the tick loop
/// steps buildings in.
///
/// A `World` comes out of [`WorldBuilder`] pre-validated: unique non-empty
/// names, existing source references, no self-sourcing. The simulation never
/// re-checks those properties.
#[derive(Debug)]
pub struct World {
    pub(crate) catalog: Catalog,
    pub(crate) buildings: SlotMap<BuildingId, Building>,
    pub(crate) by_name: HashMap<String, BuildingId>,
    pub(crate) order: Vec<BuildingId>,
}

impl World {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    pub fn find(&self, name: &str) -> Option<BuildingId> {
        self.by_name.get(name).copied()
    }

    /// Registration order; the tick loop steps buildings in exactly this
    /// order.
    pub fn order(&self) -> &[BuildingId] {
        &self.order
    }

    pub fn buildings(&self) -> impl Iterator<Item = (BuildingId, &Building)> {
        self.buildings.iter()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Building name for log lines; missing buildings render as "?".
    pub(crate) fn name_of(&self, id: BuildingId) -> &str {
        self.buildings.get(id).map(|b| b.name()).unwrap_or("?")
    }

    /// Land goods at a destination. Stores stage them in `arriving` until
    /// the next tick boundary; waste disposal releases the matching intake
    /// reservation; everything else credits the ledger directly. Buildings
    /// referenced by in-flight deliveries are assumed stable; a missing
    /// destination drops the goods.
    pub(crate) fn deposit(&mut self, dest: BuildingId, item: ItemId, qty: u32) {
        let Some(building) = self.buildings.get_mut(dest) else {
            return;
        };
        match &mut building.kind {
            BuildingKind::Store {
                arriving,
                requested,
                ..
            } => {
                *arriving += qty;
                *requested = requested.saturating_sub(qty);
            }
            BuildingKind::WasteDisposal(ws) => {
                ws.release(item, qty);
                building.storage.deposit(item, qty);
            }
            _ => building.storage.deposit(item, qty),
        }
    }
}

/// Builder for a pre-validated [`World`]. Buildings are inserted straight
/// into the arena, so the ids it returns are the final ids.
#[derive(Debug)]
pub struct WorldBuilder {
    catalog: Catalog,
    buildings: SlotMap<BuildingId, Building>,
    by_name: HashMap<String, BuildingId>,
    order: Vec<BuildingId>,
}

impl WorldBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            buildings: SlotMap::with_key(),
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn add(
        &mut self,
        name: &str,
        pos: Coord,
        kind: BuildingKind,
    ) -> Result<BuildingId, InvalidOperation> {
        if name.is_empty() {
            return Err(InvalidOperation::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(InvalidOperation::DuplicateName(name.to_string()));
        }
        let id = self
            .buildings
            .insert(Building::new(name.to_string(), pos, kind));
        self.by_name.insert(name.to_string(), id);
        self.order.push(id);
        Ok(id)
    }

    pub fn add_mine(
        &mut self,
        name: &str,
        pos: Coord,
        recipe: RecipeId,
    ) -> Result<BuildingId, InvalidOperation> {
        self.add(name, pos, BuildingKind::Mine { recipe })
    }

    pub fn add_factory(
        &mut self,
        name: &str,
        pos: Coord,
        ty: FactoryTypeId,
    ) -> Result<BuildingId, InvalidOperation> {
        self.add(name, pos, BuildingKind::Factory { ty })
    }

    pub fn add_store(
        &mut self,
        name: &str,
        pos: Coord,
        item: ItemId,
        capacity: u32,
        priority: Fixed64,
    ) -> Result<BuildingId, InvalidOperation> {
        self.add(
            name,
            pos,
            BuildingKind::Store {
                item,
                capacity,
                priority,
                arriving: 0,
                requested: 0,
            },
        )
    }

    pub fn add_waste_disposal(
        &mut self,
        name: &str,
        pos: Coord,
        config: BTreeMap<ItemId, WasteConfig>,
    ) -> Result<BuildingId, InvalidOperation> {
        self.add(name, pos, BuildingKind::WasteDisposal(WasteState::new(config)))
    }

    pub fn add_drone_port(
        &mut self,
        name: &str,
        pos: Coord,
        fleet: usize,
        speed: u32,
        radius: u32,
    ) -> Result<BuildingId, InvalidOperation> {
        self.add(
            name,
            pos,
            BuildingKind::DronePort {
                pool: DronePool::new(fleet, speed),
                radius,
            },
        )
    }

    /// Declare that `of` may source ingredients from `source`. Both must
    /// exist, a building cannot source from itself, and mines take no
    /// sources.
    pub fn add_source(
        &mut self,
        of: BuildingId,
        source: BuildingId,
    ) -> Result<(), InvalidOperation> {
        if of == source || !self.buildings.contains_key(source) {
            return Err(InvalidOperation::BuildingNotFound(format!("{source:?}")));
        }
        let Some(building) = self.buildings.get_mut(of) else {
            return Err(InvalidOperation::BuildingNotFound(format!("{of:?}")));
        };
        if matches!(building.kind, BuildingKind::Mine { .. }) {
            return Err(InvalidOperation::SourcesNotAllowed(building.name.clone()));
        }
        if !building.sources.contains(&source) {
            building.sources.push(source);
        }
        Ok(())
    }

    /// Seed a building's ledger before the simulation starts.
    pub fn set_initial_stock(
        &mut self,
        id: BuildingId,
        item: ItemId,
        qty: u32,
    ) -> Result<(), InvalidOperation> {
        let Some(building) = self.buildings.get_mut(id) else {
            return Err(InvalidOperation::BuildingNotFound(format!("{id:?}")));
        };
        building.add_to_storage(item, qty)
    }

    pub fn build(self) -> World {
        World {
            catalog: self.catalog,
            buildings: self.buildings,
            by_name: self.by_name,
            order: self.order,
        }
    }
}
