//! End-to-end scenarios across the full engine: user requests, ingredient
//! sourcing, policies, deliveries (direct and drone), stores, waste
//! disposal, and the removal lifecycle.

use fabrik_core::catalog::CatalogBuilder;
use fabrik_core::error::InvalidOperation;
use fabrik_core::log::MemoryLogger;
use fabrik_core::route::Coord;
use fabrik_core::sim::Simulation;
use fabrik_core::test_utils::*;
use fabrik_core::world::WorldBuilder;

// ===========================================================================
// Test 1: the wood/door chain
// ===========================================================================
//
// Mine "W" produces wood (latency 1, no ingredients); factory "D" produces
// door ({wood: 1}, latency 5), sourced from W, one tile away.

#[test]
fn wood_door_chain_end_to_end() {
    let mut sim = wood_door_sim();
    sim.make_user_request("door", "D").unwrap();

    // Tick 1: D selects the door request, discovers the missing wood, and
    // enqueues a sub-request on W.
    sim.step(1);
    assert_eq!(pending_len(&sim, "W"), 1);
    assert_eq!(stock(&sim, "D", "wood"), 0);

    // Tick 2: W completes the wood and a delivery is scheduled; with one
    // tile of travel it lands the same tick.
    sim.step(1);
    assert_eq!(stock(&sim, "D", "wood"), 1);
    assert!(!sim.all_requests_finished());

    // Five more ticks: D's countdown runs and the door completes.
    sim.step(5);
    assert!(sim.all_requests_finished());
    assert_eq!(stock(&sim, "D", "door"), 1);
    // The wood was consumed at completion.
    assert_eq!(stock(&sim, "D", "wood"), 0);
}

#[test]
fn completed_request_deposits_exactly_one_unit() {
    let mut sim = wood_door_sim();
    sim.make_user_request("wood", "W").unwrap();
    sim.make_user_request("wood", "W").unwrap();
    sim.finish();
    assert_eq!(stock(&sim, "W", "wood"), 2);
}

// ===========================================================================
// Test 2: drone delivery
// ===========================================================================
//
// Port "P" sits between mine and factory with both endpoints in radius;
// the wood shipment goes by drone: checkout at dispatch, pickup at the end
// of the first leg, deposit at the end of the second, return on the third.

#[test]
fn drone_delivery_three_legs() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let door = cb.register_item("door").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let door_recipe = cb.register_recipe(door, &[(wood, 1)], 5).unwrap();
    let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let factory = wb.add_factory("D", Coord::new(4, 0), ty).unwrap();
    wb.add_drone_port("P", Coord::new(2, 0), 1, 1, 10).unwrap();
    wb.add_source(factory, mine).unwrap();
    let mut sim = Simulation::new(wb.build());

    sim.make_user_request("door", "D").unwrap();
    assert_eq!(drones_available(&sim, "P"), 1);

    // Tick 1: sub-request lands on W. Tick 2: W completes the wood and the
    // drone is dispatched -- availability drops immediately, but the goods
    // stay at W until the first leg ends.
    sim.step(2);
    assert_eq!(drones_available(&sim, "P"), 0);
    assert_eq!(stock(&sim, "W", "wood"), 1);

    // First leg is two tiles (P -> W): pickup at the end of tick 3.
    sim.step(1);
    assert_eq!(stock(&sim, "W", "wood"), 0);
    assert_eq!(stock(&sim, "D", "wood"), 0);

    // Second leg is four tiles (W -> D): deposit at the end of tick 7.
    sim.step(4);
    assert_eq!(stock(&sim, "D", "wood"), 1);
    assert_eq!(drones_available(&sim, "P"), 0);

    // Third leg is two tiles (D -> P): the pre-dispatch count is restored.
    sim.step(2);
    assert_eq!(drones_available(&sim, "P"), 1);

    // The door itself finishes its five-tick countdown.
    sim.finish();
    assert_eq!(stock(&sim, "D", "door"), 1);
}

#[test]
fn out_of_radius_falls_back_to_direct_delivery() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let door = cb.register_item("door").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let door_recipe = cb.register_recipe(door, &[(wood, 1)], 2).unwrap();
    let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let factory = wb.add_factory("D", Coord::new(3, 0), ty).unwrap();
    // Radius 1 covers neither endpoint from (20, 20).
    wb.add_drone_port("P", Coord::new(20, 20), 1, 1, 1).unwrap();
    wb.add_source(factory, mine).unwrap();
    let mut sim = Simulation::new(wb.build());

    sim.make_user_request("door", "D").unwrap();
    sim.finish();
    assert_eq!(stock(&sim, "D", "door"), 1);
    // The drone never moved.
    assert_eq!(drones_available(&sim, "P"), 1);
}

// ===========================================================================
// Test 3: policies through the simulation
// ===========================================================================

/// Factory type with three ingredient-free recipes of latencies 10, 5, 15.
fn three_latency_sim() -> Simulation {
    let mut cb = CatalogBuilder::new();
    let mut recipes = Vec::new();
    for (name, latency) in [("slow", 10u64), ("quick", 5), ("slowest", 15)] {
        let item = cb.register_item(name).unwrap();
        recipes.push(cb.register_recipe(item, &[], latency).unwrap());
    }
    let ty = cb.register_type("mixed", recipes).unwrap();
    let mut wb = WorldBuilder::new(cb.build());
    wb.add_factory("F", Coord::new(0, 0), ty).unwrap();
    Simulation::new(wb.build())
}

#[test]
fn fifo_completes_in_insertion_order() {
    let handle = MemoryLogger::new();
    let mut sim = three_latency_sim().with_logger(Box::new(handle.clone()), 0);
    sim.make_user_request("slow", "F").unwrap();
    sim.make_user_request("quick", "F").unwrap();
    sim.finish();

    let lines = handle.lines();
    let completions: Vec<&String> = lines.iter().filter(|l| l.contains("complete")).collect();
    assert_eq!(completions.len(), 2);
    assert!(completions[0].contains("slow"));
    assert!(completions[1].contains("quick"));
}

#[test]
fn sjf_runs_the_shortest_job_first() {
    let handle = MemoryLogger::new();
    let mut sim = three_latency_sim().with_logger(Box::new(handle.clone()), 0);
    sim.set_policy("request", "sjf", "F").unwrap();
    sim.make_user_request("slow", "F").unwrap();
    sim.make_user_request("quick", "F").unwrap();
    sim.make_user_request("slowest", "F").unwrap();

    // The five-tick job is selected first and completes at tick 5.
    sim.step(5);
    assert!(handle.contains("complete: quick at F"));
    assert!(!handle.contains("complete: slow at F"));
    sim.finish();
}

#[test]
fn ready_policy_never_selects_unsatisfiable_requests() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let door = cb.register_item("door").unwrap();
    let stool = cb.register_item("stool").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let door_recipe = cb.register_recipe(door, &[(wood, 1)], 2).unwrap();
    let stool_recipe = cb.register_recipe(stool, &[], 2).unwrap();
    let ty = cb
        .register_type("carpentry", vec![door_recipe, stool_recipe])
        .unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(5, 5), wood_recipe).unwrap();
    let factory = wb.add_factory("F", Coord::new(0, 0), ty).unwrap();
    wb.add_source(factory, mine).unwrap();
    let mut sim = Simulation::new(wb.build());
    sim.set_policy("request", "ready", "F").unwrap();

    // The door needs wood the factory does not hold; the stool needs
    // nothing. Ready skips the older door request entirely.
    sim.make_user_request("door", "F").unwrap();
    sim.make_user_request("stool", "F").unwrap();
    sim.step(10);

    assert_eq!(stock(&sim, "F", "stool"), 1);
    assert_eq!(stock(&sim, "F", "door"), 0);
    // The door request was never selected, so its wood was never sourced.
    assert_eq!(pending_len(&sim, "F"), 1);
    assert!(!sim.all_requests_finished());
}

#[test]
fn recursive_latency_prefers_the_stocked_store() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let door = cb.register_item("door").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 5).unwrap();
    let door_recipe = cb.register_recipe(door, &[(wood, 1)], 2).unwrap();
    let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let store = wb
        .add_store("S", Coord::new(1, 0), wood, 4, fixed(0.0))
        .unwrap();
    let factory = wb.add_factory("D", Coord::new(2, 0), ty).unwrap();
    wb.add_source(factory, mine).unwrap();
    wb.add_source(factory, store).unwrap();
    wb.set_initial_stock(store, wood, 2).unwrap();
    let mut sim = Simulation::new(wb.build());

    // Queue-length scores tie at zero, so the default policy picks the
    // first-listed mine despite its five-tick recipe.
    sim.make_user_request("door", "D").unwrap();
    sim.step(1);
    assert_eq!(pending_len(&sim, "W"), 1);

    // The recursive estimator sees one-tick stock service at the store.
    let mut sim = {
        let mut cb = CatalogBuilder::new();
        let wood = cb.register_item("wood").unwrap();
        let door = cb.register_item("door").unwrap();
        let wood_recipe = cb.register_recipe(wood, &[], 5).unwrap();
        let door_recipe = cb.register_recipe(door, &[(wood, 1)], 2).unwrap();
        let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();
        let mut wb = WorldBuilder::new(cb.build());
        let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
        let store = wb
            .add_store("S", Coord::new(1, 0), wood, 4, fixed(0.0))
            .unwrap();
        let factory = wb.add_factory("D", Coord::new(2, 0), ty).unwrap();
        wb.add_source(factory, mine).unwrap();
        wb.add_source(factory, store).unwrap();
        wb.set_initial_stock(store, wood, 2).unwrap();
        Simulation::new(wb.build())
    };
    sim.set_policy("source", "recursivelat", "D").unwrap();
    sim.make_user_request("door", "D").unwrap();
    sim.step(1);
    assert_eq!(pending_len(&sim, "W"), 0);
    assert_eq!(pending_len(&sim, "S"), 1);

    sim.finish();
    assert_eq!(stock(&sim, "D", "door"), 1);
    // The store served one of its two units.
    assert_eq!(stock(&sim, "S", "wood"), 1);
}

#[test]
fn policy_scores_are_logged_at_verbosity_two() {
    let handle = MemoryLogger::new();
    let mut sim = wood_door_sim().with_logger(Box::new(handle.clone()), 2);
    sim.make_user_request("door", "D").unwrap();
    sim.step(1);
    assert!(handle.contains("score W for wood"));
    sim.finish();
}

// ===========================================================================
// Test 4: stores
// ===========================================================================

#[test]
fn store_replenishes_to_its_fill_target() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let store = wb
        .add_store("S", Coord::new(1, 0), wood, 4, fixed(0.5))
        .unwrap();
    wb.add_source(store, mine).unwrap();
    let mut sim = Simulation::new(wb.build());

    // Fill target is ceil(4 * 0.5) = 2. The store orders both units; the
    // mine produces one per tick; arrivals stage for one tick boundary.
    sim.finish();
    assert_eq!(stock(&sim, "S", "wood"), 2);

    // Demand is not re-issued once the target is met.
    sim.step(3);
    assert_eq!(stock(&sim, "S", "wood"), 2);
    assert_eq!(pending_len(&sim, "W"), 0);
}

#[test]
fn store_serves_requests_from_current_stock() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let mut wb = WorldBuilder::new(cb.build());
    let store = wb
        .add_store("S", Coord::new(0, 0), wood, 8, fixed(0.0))
        .unwrap();
    wb.set_initial_stock(store, wood, 3).unwrap();
    let handle = MemoryLogger::new();
    let mut sim = Simulation::new(wb.build()).with_logger(Box::new(handle.clone()), 0);

    sim.make_user_request("wood", "S").unwrap();
    sim.step(1);
    assert!(handle.contains("complete: wood at S"));
    assert!(sim.all_requests_finished());
    // Serving a user request hands the unit over in place.
    assert_eq!(stock(&sim, "S", "wood"), 3);
}

// ===========================================================================
// Test 5: waste disposal
// ===========================================================================

#[test]
fn waste_shipment_reserves_processes_and_destroys() {
    use fabrik_core::id::ItemId;
    use fabrik_core::waste::WasteConfig;
    use std::collections::BTreeMap;

    let mut cb = CatalogBuilder::new();
    let slag = cb.register_item("slag").unwrap();
    let slag_recipe = cb.register_recipe(slag, &[], 1).unwrap();
    let mut wb = WorldBuilder::new(cb.build());
    wb.add_mine("G", Coord::new(0, 0), slag_recipe).unwrap();
    let mut config: BTreeMap<ItemId, WasteConfig> = BTreeMap::new();
    config.insert(
        slag,
        WasteConfig {
            capacity: 2,
            rate: 2,
            processing_ticks: 3,
        },
    );
    wb.add_waste_disposal("X", Coord::new(1, 0), config).unwrap();
    let mut sim = Simulation::new(wb.build());

    sim.make_disposal_request("slag", "G", "X").unwrap();
    sim.make_disposal_request("slag", "G", "X").unwrap();
    // Capacity 2 is fully reserved now.
    assert!(matches!(
        sim.make_disposal_request("slag", "G", "X"),
        Err(InvalidOperation::CapacityExceeded { .. })
    ));

    // Tick 1: G completes the first unit; the delivery lands the same tick
    // and releases its reservation.
    sim.step(1);
    assert_eq!(stock(&sim, "X", "slag"), 1);

    // Everything is destroyed eventually: batches run three ticks each and
    // is_finished holds off until the machine is idle again.
    sim.finish();
    assert_eq!(stock(&sim, "X", "slag"), 0);
    assert!(sim.all_requests_finished());

    // Capacity is free again.
    sim.make_disposal_request("slag", "G", "X").unwrap();
    sim.finish();
    assert_eq!(stock(&sim, "X", "slag"), 0);
}

// ===========================================================================
// Test 6: removal lifecycle
// ===========================================================================

#[test]
fn removal_gates_on_outstanding_work_then_rejects_requests() {
    let mut sim = wood_door_sim();
    sim.make_user_request("wood", "W").unwrap();

    assert!(matches!(
        sim.mark_for_removal("W"),
        Err(InvalidOperation::RemovalBlocked(_))
    ));

    sim.finish();
    sim.mark_for_removal("W").unwrap();
    assert!(matches!(
        sim.make_user_request("wood", "W"),
        Err(InvalidOperation::PendingRemoval(_))
    ));

    // A pending-removal source no longer counts for feasibility, so the
    // door request is rejected up front.
    assert!(matches!(
        sim.make_user_request("door", "D"),
        Err(InvalidOperation::Unsourceable { .. })
    ));
}

// ===========================================================================
// Test 7: multi-unit ingredient demand
// ===========================================================================

#[test]
fn one_sub_request_per_missing_unit() {
    let mut cb = CatalogBuilder::new();
    let wood = cb.register_item("wood").unwrap();
    let table = cb.register_item("table").unwrap();
    let wood_recipe = cb.register_recipe(wood, &[], 1).unwrap();
    let table_recipe = cb.register_recipe(table, &[(wood, 3)], 2).unwrap();
    let ty = cb.register_type("carpentry", vec![table_recipe]).unwrap();

    let mut wb = WorldBuilder::new(cb.build());
    let mine = wb.add_mine("W", Coord::new(0, 0), wood_recipe).unwrap();
    let factory = wb.add_factory("T", Coord::new(1, 0), ty).unwrap();
    wb.add_source(factory, mine).unwrap();
    let mut sim = Simulation::new(wb.build());

    sim.make_user_request("table", "T").unwrap();
    sim.step(1);
    // Three units missing, three sub-requests.
    assert_eq!(pending_len(&sim, "W"), 3);

    sim.finish();
    assert_eq!(stock(&sim, "T", "table"), 1);
    assert_eq!(stock(&sim, "T", "wood"), 0);
    assert_eq!(stock(&sim, "W", "wood"), 0);
}
