//! Shared test helpers for integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to unit tests and, via the `test-utils` feature, to the
//! `tests/` directory.

use crate::catalog::CatalogBuilder;
use crate::fixed::Fixed64;
use crate::route::Coord;
use crate::sim::Simulation;
use crate::world::WorldBuilder;

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Current stock of `item` at `building`, by name; 0 when either is
/// unknown.
pub fn stock(sim: &Simulation, building: &str, item: &str) -> u32 {
    let world = sim.world();
    let Some(id) = world.find(building) else {
        return 0;
    };
    let Some(item) = world.catalog().item_id(item) else {
        return 0;
    };
    world
        .get(id)
        .map(|b| b.storage().quantity(item))
        .unwrap_or(0)
}

/// Pending queue length of `building`, by name.
pub fn pending_len(sim: &Simulation, building: &str) -> usize {
    let world = sim.world();
    world
        .find(building)
        .and_then(|id| world.get(id))
        .map(|b| b.pending_len())
        .unwrap_or(0)
}

/// Idle drones at a port, by name.
pub fn drones_available(sim: &Simulation, port: &str) -> usize {
    use crate::building::BuildingKind;
    let world = sim.world();
    world
        .find(port)
        .and_then(|id| world.get(id))
        .and_then(|b| match b.kind() {
            BuildingKind::DronePort { pool, .. } => Some(pool.available()),
            _ => None,
        })
        .unwrap_or(0)
}

/// The canonical two-building chain: mine "W" producing `wood` (latency 1,
/// no ingredients) at (0,0), factory "D" producing `door` ({wood: 1},
/// latency 5) at (1,0), sourced from W. W registers before D.
pub fn wood_door_sim() -> Simulation {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let door = cb.register_item("door").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let door_recipe = cb.register_recipe(door, &[(wood, 1)], 5).unwrap();
    let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let factory = wb.add_factory("D", Coord::new(1, 0), ty).unwrap();
    wb.add_source(factory, mine).unwrap();
    Simulation::new(wb.build())
}
