//! The Simulation: owns the world, the delivery schedule, and the clock,
//! and drives everything through the tick pipeline.
//!
//! Each `step(1)` runs three phases:
//!
//! 1. **Buildings** -- every building advances once, in registration order:
//!    stores promote arriving stock and issue replenishment demand, waste
//!    disposals advance their processing batch, producers run the
//!    production step (request selection, ingredient sourcing, countdown,
//!    completion).
//! 2. **Deliveries** -- the schedule advances every in-flight transfer and
//!    finalizes arrivals.
//! 3. **Bookkeeping** -- the clock was already advanced at phase entry; no
//!    other global state exists.
//!
//! All mutating entry points (`make_user_request`, `set_policy`, ...) fail
//! synchronously with [`InvalidOperation`] and queue nothing on failure.

use crate::building::{Building, BuildingKind};
use crate::delivery::{Delivery, DeliverySchedule, DirectDelivery, DroneDelivery};
use crate::error::InvalidOperation;
use crate::fixed::{Fixed64, Ticks};
use crate::id::{BuildingId, ItemId, OrderNo};
use crate::log::{NullLogger, SimLogger, V_ASSIGNMENT, V_SCORES, Verbosity};
use crate::policy::RequestPolicy;
use crate::request::{Request, RequestStatus};
use crate::route::{ManhattanPlanner, RoutePlanner};
use crate::source_policy::SourcePolicy;
use crate::world::World;

/// The production-scheduling and delivery engine. Single-threaded and
/// tick-driven: all work for a tick completes before the next begins.
pub struct Simulation {
    world: World,
    schedule: DeliverySchedule,
    planner: Box<dyn RoutePlanner>,
    logger: Box<dyn SimLogger>,
    verbosity: Verbosity,
    clock: Ticks,
    /// Next request order number. Explicit counter, not global state.
    next_order: u64,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        Self {
            world,
            schedule: DeliverySchedule::new(),
            planner: Box::new(ManhattanPlanner),
            logger: Box::new(NullLogger),
            verbosity: 0,
            clock: 0,
            next_order: 1,
        }
    }

    /// Replace the default Manhattan planner with a real pathfinder.
    pub fn with_planner(mut self, planner: Box<dyn RoutePlanner>) -> Self {
        self.planner = planner;
        self
    }

    /// Attach a log sink at the given verbosity.
    pub fn with_logger(mut self, logger: Box<dyn SimLogger>, verbosity: Verbosity) -> Self {
        self.logger = logger;
        self.verbosity = verbosity;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn schedule(&self) -> &DeliverySchedule {
        &self.schedule
    }

    pub fn current_time(&self) -> Ticks {
        self.clock
    }

    /// Every building idle (no pending, no active, no mid-processing
    /// batch) and no delivery in flight.
    pub fn all_requests_finished(&self) -> bool {
        self.schedule.is_empty() && self.world.buildings.values().all(Building::is_finished)
    }

    fn alloc_order(&mut self) -> OrderNo {
        let order = OrderNo(self.next_order);
        self.next_order += 1;
        order
    }

    // -----------------------------------------------------------------------
    // Driver entry points
    // -----------------------------------------------------------------------

    /// Queue a user request for one unit of `item_name` at `building_name`.
    ///
    /// Validated synchronously before anything is queued: the item and
    /// building must exist, the building must be able to produce the item
    /// and accept work, and every ingredient of the resolved recipe must be
    /// either on hand or coverable by at least one configured source. Any
    /// failure raises [`InvalidOperation`] and queues nothing.
    pub fn make_user_request(
        &mut self,
        item_name: &str,
        building_name: &str,
    ) -> Result<OrderNo, InvalidOperation> {
        let item = self
            .world
            .catalog
            .item_id(item_name)
            .ok_or_else(|| InvalidOperation::UnknownItem(item_name.to_string()))?;
        let id = self
            .world
            .find(building_name)
            .ok_or_else(|| InvalidOperation::BuildingNotFound(building_name.to_string()))?;

        let (recipe, remaining) = {
            let Some(building) = self.world.get(id) else {
                return Err(InvalidOperation::BuildingNotFound(building_name.to_string()));
            };
            if building.is_pending_removal() {
                return Err(InvalidOperation::PendingRemoval(building_name.to_string()));
            }
            if !building.can_produce(item, &self.world.catalog) {
                return Err(InvalidOperation::CannotProduce {
                    building: building_name.to_string(),
                    item: item_name.to_string(),
                });
            }
            let recipe = building.recipe_for(item, &self.world.catalog);

            // One-level feasibility: a top-level request whose ingredients
            // can never be supplied is rejected here; sub-requests are not
            // re-checked and may pend forever.
            if let Some(rid) = recipe
                && let Some(r) = self.world.catalog.get_recipe(rid)
            {
                for (&ing, &need) in &r.ingredients {
                    let stocked = building.storage.quantity(ing) >= need;
                    let sourceable = building.sources.iter().any(|&s| {
                        self.world.get(s).is_some_and(|sb| {
                            sb.can_accept_work() && sb.can_produce(ing, &self.world.catalog)
                        })
                    });
                    if !stocked && !sourceable {
                        return Err(InvalidOperation::Unsourceable {
                            building: building_name.to_string(),
                            item: self.world.catalog.item_name(ing).to_string(),
                        });
                    }
                }
            }
            (recipe, building.service_latency(item, &self.world.catalog))
        };

        let order = self.alloc_order();
        let request = Request::new(order, item, recipe, id, None, remaining);
        match self.world.get_mut(id) {
            Some(building) => building.add_request(request)?,
            None => return Err(InvalidOperation::BuildingNotFound(building_name.to_string())),
        }
        if self.verbosity >= V_ASSIGNMENT {
            let line = format!(
                "[{}] order {} queued: {} at {}",
                self.clock, order.0, item_name, building_name
            );
            self.logger.log(&line);
        }
        Ok(order)
    }

    /// Ship one unit of waste from `producer_name` to the disposal site,
    /// reserving intake capacity up front. The reservation is released when
    /// the delivery lands.
    pub fn make_disposal_request(
        &mut self,
        item_name: &str,
        producer_name: &str,
        disposal_name: &str,
    ) -> Result<OrderNo, InvalidOperation> {
        let item = self
            .world
            .catalog
            .item_id(item_name)
            .ok_or_else(|| InvalidOperation::UnknownItem(item_name.to_string()))?;
        let producer = self
            .world
            .find(producer_name)
            .ok_or_else(|| InvalidOperation::BuildingNotFound(producer_name.to_string()))?;
        let disposal = self
            .world
            .find(disposal_name)
            .ok_or_else(|| InvalidOperation::BuildingNotFound(disposal_name.to_string()))?;

        let (recipe, remaining) = {
            let Some(pb) = self.world.get(producer) else {
                return Err(InvalidOperation::BuildingNotFound(producer_name.to_string()));
            };
            if pb.is_pending_removal() {
                return Err(InvalidOperation::PendingRemoval(producer_name.to_string()));
            }
            if !pb.can_produce(item, &self.world.catalog) {
                return Err(InvalidOperation::CannotProduce {
                    building: producer_name.to_string(),
                    item: item_name.to_string(),
                });
            }
            (
                pb.recipe_for(item, &self.world.catalog),
                pb.service_latency(item, &self.world.catalog),
            )
        };

        // Reserve intake capacity before queueing anything.
        {
            let Some(db) = self.world.get_mut(disposal) else {
                return Err(InvalidOperation::BuildingNotFound(disposal_name.to_string()));
            };
            let stored = db.storage.quantity(item);
            let BuildingKind::WasteDisposal(ws) = &mut db.kind else {
                return Err(InvalidOperation::CannotProduce {
                    building: disposal_name.to_string(),
                    item: item_name.to_string(),
                });
            };
            ws.reserve(item, 1, stored)?;
        }

        let order = self.alloc_order();
        let request = Request::new(order, item, recipe, producer, Some(disposal), remaining);
        let accepted = self
            .world
            .get_mut(producer)
            .map(|b| b.add_request(request))
            .unwrap_or(Err(InvalidOperation::BuildingNotFound(
                producer_name.to_string(),
            )));
        if let Err(err) = accepted {
            // Roll the reservation back; nothing was queued.
            if let Some(db) = self.world.get_mut(disposal)
                && let BuildingKind::WasteDisposal(ws) = &mut db.kind
            {
                ws.release(item, 1);
            }
            return Err(err);
        }
        Ok(order)
    }

    /// Install a policy on one building or, with target `"*"`, on all.
    /// `kind` is `"request"` or `"source"`; names are the policy names
    /// (`fifo`/`sjf`/`ready`, `qlen`/`simplelat`/`recursivelat`).
    pub fn set_policy(
        &mut self,
        kind: &str,
        name: &str,
        target: &str,
    ) -> Result<(), InvalidOperation> {
        #[derive(Clone, Copy)]
        enum Parsed {
            Request(RequestPolicy),
            Source(SourcePolicy),
        }
        let parsed = match kind {
            "request" => Parsed::Request(RequestPolicy::parse(name)?),
            "source" => Parsed::Source(SourcePolicy::parse(name)?),
            other => return Err(InvalidOperation::UnknownPolicyKind(other.to_string())),
        };
        let targets: Vec<BuildingId> = if target == "*" {
            self.world.order.clone()
        } else {
            vec![self
                .world
                .find(target)
                .ok_or_else(|| InvalidOperation::BuildingNotFound(target.to_string()))?]
        };
        for id in targets {
            if let Some(building) = self.world.get_mut(id) {
                match parsed {
                    Parsed::Request(p) => building.request_policy = p,
                    Parsed::Source(p) => building.source_policy = p,
                }
            }
        }
        Ok(())
    }

    /// Mark a building for removal; gated on zero outstanding work.
    pub fn mark_for_removal(&mut self, building_name: &str) -> Result<(), InvalidOperation> {
        match self.world.find(building_name).and_then(|id| self.world.get_mut(id)) {
            Some(building) => building.mark_for_removal(),
            None => Err(InvalidOperation::BuildingNotFound(building_name.to_string())),
        }
    }

    /// Advance the simulation `n` ticks.
    pub fn step(&mut self, n: u64) {
        for _ in 0..n {
            self.step_once();
        }
    }

    /// Step until every building is finished and no delivery is in flight.
    /// Loops forever on permanently unsatisfiable demand -- that liveness
    /// property is the caller's responsibility.
    pub fn finish(&mut self) {
        while !self.all_requests_finished() {
            self.step(1);
        }
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    fn step_once(&mut self) {
        self.clock += 1;
        let order = self.world.order.clone();
        for id in order {
            self.step_building(id);
        }
        self.schedule.step(
            &mut self.world,
            self.clock,
            self.verbosity,
            self.logger.as_mut(),
        );
    }

    fn step_building(&mut self, id: BuildingId) {
        enum Tag {
            Producer,
            Store,
            Waste,
            Port,
        }
        let tag = match self.world.get(id).map(|b| &b.kind) {
            Some(BuildingKind::Store { .. }) => Tag::Store,
            Some(BuildingKind::WasteDisposal(_)) => Tag::Waste,
            Some(BuildingKind::DronePort { .. }) => Tag::Port,
            Some(_) => Tag::Producer,
            None => return,
        };
        match tag {
            Tag::Store => {
                self.promote_and_replenish_store(id);
                self.step_production(id);
            }
            Tag::Waste => self.step_waste(id),
            Tag::Port => {}
            Tag::Producer => self.step_production(id),
        }
    }

    /// Tick-boundary work for a store: promote goods that arrived last tick
    /// into current stock, then issue replenishment demand up to the fill
    /// target `ceil(capacity * priority)`.
    fn promote_and_replenish_store(&mut self, id: BuildingId) {
        let (item, missing) = {
            let Some(building) = self.world.buildings.get_mut(id) else {
                return;
            };
            let Building { kind, storage, .. } = building;
            let BuildingKind::Store {
                item,
                capacity,
                priority,
                arriving,
                requested,
            } = kind
            else {
                return;
            };
            let promoted = std::mem::take(arriving);
            storage.deposit(*item, promoted);

            let target = fill_target(*capacity, *priority);
            let committed = storage.quantity(*item).saturating_add(*requested);
            (*item, target.saturating_sub(committed))
        };
        for _ in 0..missing {
            if self.assign_source(id, item).is_none() {
                break;
            }
            if let Some(building) = self.world.buildings.get_mut(id)
                && let BuildingKind::Store { requested, .. } = &mut building.kind
            {
                *requested += 1;
            }
        }
    }

    /// Advance a waste disposal's processing machine: finish the running
    /// batch, or start destroying stored waste.
    fn step_waste(&mut self, id: BuildingId) {
        let finished = {
            let Some(building) = self.world.buildings.get_mut(id) else {
                return;
            };
            let Building { kind, storage, .. } = building;
            let BuildingKind::WasteDisposal(ws) = kind else {
                return;
            };
            let finished = ws.tick_batch();
            if finished.is_none() && ws.is_idle() {
                let next = ws
                    .configured_types()
                    .map(|(item, cfg)| (item, cfg.rate))
                    .find(|&(item, _)| storage.quantity(item) > 0);
                if let Some((item, rate)) = next {
                    let qty = rate.max(1).min(storage.quantity(item));
                    let _ = storage.withdraw(item, qty);
                    ws.start_batch(item, qty);
                }
            }
            finished
        };
        if let Some(batch) = finished
            && self.verbosity >= V_ASSIGNMENT
        {
            let line = format!(
                "[{}] processed {} {} at {}",
                self.clock,
                batch.quantity,
                self.world.catalog().item_name(batch.item),
                self.world.name_of(id),
            );
            self.logger.log(&line);
        }
    }

    /// The production step for request-serving buildings (mines,
    /// factories, stores).
    fn step_production(&mut self, id: BuildingId) {
        // Select a request when idle; the policy may decline.
        let mut fresh = false;
        {
            let Some(building) = self.world.buildings.get_mut(id) else {
                return;
            };
            if building.current.is_none() {
                let policy = building.request_policy;
                match policy.pop_request(
                    &building.storage,
                    &mut building.pending,
                    &self.world.catalog,
                ) {
                    Some(mut request) => {
                        request.status = RequestStatus::Blocked;
                        building.current = Some(request);
                        fresh = true;
                    }
                    None => return,
                }
            }
        }

        // Ingredient check.
        let (satisfied, shortfalls, is_store) = {
            let Some(building) = self.world.buildings.get(id) else {
                return;
            };
            let Some(current) = building.current.as_ref() else {
                return;
            };
            let needs = current.needs(&self.world.catalog);
            let mut shortfalls: Vec<(ItemId, u32)> = Vec::new();
            for (&ing, &need) in &needs {
                let have = building.storage.quantity(ing);
                if have < need {
                    shortfalls.push((ing, need - have));
                }
            }
            (
                shortfalls.is_empty(),
                shortfalls,
                matches!(building.kind, BuildingKind::Store { .. }),
            )
        };

        if !satisfied {
            // Missing ingredients are sourced exactly once, when the
            // request becomes current: one sub-request per missing unit.
            // If no configured source can supply a unit it is not retried --
            // the request stays frozen.
            if fresh {
                for (ing, missing) in shortfalls {
                    for _ in 0..missing {
                        if self.assign_source(id, ing).is_none() {
                            break;
                        }
                        if is_store
                            && let Some(building) = self.world.buildings.get_mut(id)
                            && let BuildingKind::Store { requested, .. } = &mut building.kind
                        {
                            *requested += 1;
                        }
                    }
                }
            }
            if let Some(building) = self.world.buildings.get_mut(id)
                && let Some(current) = building.current.as_mut()
            {
                current.status = RequestStatus::Blocked;
            }
            return;
        }

        // All ingredients present: the countdown runs.
        let completed = {
            let Some(building) = self.world.buildings.get_mut(id) else {
                return;
            };
            let Some(current) = building.current.as_mut() else {
                return;
            };
            current.status = RequestStatus::Working;
            current.remaining = current.remaining.saturating_sub(1);
            current.remaining == 0
        };
        if completed {
            self.complete_current(id);
        }
    }

    /// Completion: consume the needs, deposit exactly one output unit, and
    /// spawn the delivery when a target exists. The completed request is
    /// discarded; the producer re-evaluates next tick.
    fn complete_current(&mut self, id: BuildingId) {
        let Some(building) = self.world.buildings.get_mut(id) else {
            return;
        };
        let Some(request) = building.current.take() else {
            return;
        };
        let needs = request.needs(&self.world.catalog);
        for (&ing, &need) in &needs {
            // Present by the per-tick ingredient guard.
            let _ = building.storage.withdraw(ing, need);
        }
        building.storage.deposit(request.item(), 1);

        let line = format!(
            "[{}] order {} complete: {} at {}",
            self.clock,
            request.order().0,
            self.world.catalog().item_name(request.item()),
            self.world.name_of(id),
        );
        self.logger.log(&line);

        if let Some(target) = request.target() {
            self.spawn_delivery(id, target, request.item());
        }
    }

    /// Pick a source for one unit of `item` and enqueue a sub-request
    /// there. Returns the chosen source, or `None` when no configured
    /// source can supply the item.
    fn assign_source(&mut self, producer: BuildingId, item: ItemId) -> Option<BuildingId> {
        let (policy, candidates) = {
            let building = self.world.get(producer)?;
            let candidates: Vec<BuildingId> = building
                .sources
                .iter()
                .copied()
                .filter(|&s| {
                    self.world.get(s).is_some_and(|sb| {
                        sb.can_accept_work() && sb.can_produce(item, &self.world.catalog)
                    })
                })
                .collect();
            (building.source_policy, candidates)
        };
        if candidates.is_empty() {
            return None;
        }

        let chosen = {
            let world = &self.world;
            let verbosity = self.verbosity;
            let clock = self.clock;
            let logger = &mut self.logger;
            let mut on_score = |candidate: BuildingId, score: Ticks| {
                if verbosity >= V_SCORES {
                    logger.log(&format!(
                        "[{clock}] score {} for {}: {score}",
                        world.name_of(candidate),
                        world.catalog().item_name(item),
                    ));
                }
            };
            policy.select_source(item, producer, &candidates, world, &mut on_score)?
        };

        let (recipe, remaining) = {
            let source = self.world.get(chosen)?;
            (
                source.recipe_for(item, &self.world.catalog),
                source.service_latency(item, &self.world.catalog),
            )
        };
        let order = self.alloc_order();
        let request = Request::new(order, item, recipe, chosen, Some(producer), remaining);
        let accepted = self
            .world
            .get_mut(chosen)
            .map(|b| b.add_request(request).is_ok())
            .unwrap_or(false);
        if !accepted {
            return None;
        }
        if self.verbosity >= V_ASSIGNMENT {
            let line = format!(
                "[{}] order {}: {} x1 assigned to {}",
                self.clock,
                order.0,
                self.world.catalog().item_name(item),
                self.world.name_of(chosen),
            );
            self.logger.log(&line);
        }
        Some(chosen)
    }

    /// Spawn the transfer for a completed request. The first registered
    /// drone port with an idle drone whose radius covers both endpoints
    /// takes the job; otherwise a direct delivery travels the planner's
    /// route. Direct deliveries take the goods now; drones pick up at the
    /// end of their first leg.
    fn spawn_delivery(&mut self, source: BuildingId, target: BuildingId, item: ItemId) {
        let Some(spos) = self.world.get(source).map(|b| b.pos) else {
            return;
        };
        let Some(tpos) = self.world.get(target).map(|b| b.pos) else {
            return;
        };

        let port_order = self.world.order.clone();
        for pid in port_order {
            let covered = {
                let Some(port) = self.world.get(pid) else {
                    continue;
                };
                let BuildingKind::DronePort { pool, radius } = &port.kind else {
                    continue;
                };
                pool.available() > 0
                    && port.pos.manhattan(spos) <= *radius
                    && port.pos.manhattan(tpos) <= *radius
            };
            if !covered {
                continue;
            }
            let Some((ppos, drone)) = self.world.get_mut(pid).and_then(|b| {
                let pos = b.pos;
                match &mut b.kind {
                    BuildingKind::DronePort { pool, .. } => {
                        pool.checkout().map(|drone| (pos, drone))
                    }
                    _ => None,
                }
            }) else {
                continue;
            };
            let first_leg = drone.leg_ticks(ppos.manhattan(spos));
            if self.verbosity >= V_ASSIGNMENT {
                let line = format!(
                    "[{}] drone {} dispatched from {}: {} {} -> {}",
                    self.clock,
                    drone.id,
                    self.world.name_of(pid),
                    self.world.catalog().item_name(item),
                    self.world.name_of(source),
                    self.world.name_of(target),
                );
                self.logger.log(&line);
            }
            self.schedule.push(Delivery::Drone(DroneDelivery::new(
                pid, source, target, item, 1, drone, first_leg,
            )));
            return;
        }

        let Some(route) = self.planner.route(spos, tpos) else {
            // No route: the unit stays in the producer's storage.
            if self.verbosity >= V_ASSIGNMENT {
                let line = format!(
                    "[{}] no route {} -> {}, delivery dropped",
                    self.clock,
                    self.world.name_of(source),
                    self.world.name_of(target),
                );
                self.logger.log(&line);
            }
            return;
        };
        let travel = Ticks::from(route.length).max(1);
        let loaded = self
            .world
            .get_mut(source)
            .map(|b| b.storage.withdraw(item, 1).is_ok())
            .unwrap_or(false);
        if loaded {
            if self.verbosity >= V_ASSIGNMENT {
                let line = format!(
                    "[{}] delivery dispatched: {} {} -> {} ({travel} ticks)",
                    self.clock,
                    self.world.catalog().item_name(item),
                    self.world.name_of(source),
                    self.world.name_of(target),
                );
                self.logger.log(&line);
            }
            self.schedule.push(Delivery::Direct(DirectDelivery::new(
                source, target, item, 1, travel,
            )));
        }
    }
}

/// Fill target for a store: `ceil(capacity * priority)`, clamped to the
/// capacity.
fn fill_target(capacity: u32, priority: Fixed64) -> u32 {
    let raw = Fixed64::from_num(capacity) * priority;
    let mut whole: i64 = raw.to_num();
    if raw.frac() > Fixed64::ZERO {
        whole += 1;
    }
    whole.clamp(0, i64::from(capacity)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::log::MemoryLogger;
    use crate::route::Coord;
    use crate::world::WorldBuilder;

    fn wood_door_world() -> Simulation {
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

    #[test]
    fn unknown_item_rejected_synchronously() {
        let mut sim = wood_door_world();
        assert!(matches!(
            sim.make_user_request("granite", "D"),
            Err(InvalidOperation::UnknownItem(_))
        ));
        assert!(sim.all_requests_finished());
    }

    #[test]
    fn unknown_building_rejected() {
        let mut sim = wood_door_world();
        assert!(matches!(
            sim.make_user_request("door", "X"),
            Err(InvalidOperation::BuildingNotFound(_))
        ));
    }

    #[test]
    fn wrong_producer_rejected() {
        let mut sim = wood_door_world();
        assert!(matches!(
            sim.make_user_request("door", "W"),
            Err(InvalidOperation::CannotProduce { .. })
        ));
    }

    #[test]
    fn unsourceable_top_level_request_rejected() {
        // A door factory with no wood source and no stock.
        let mut cb = CatalogBuilder::new();
        let wood = cb.register_item("wood").unwrap();
        let door = cb.register_item("door").unwrap();
        let door_recipe = cb.register_recipe(door, &[(wood, 1)], 5).unwrap();
        let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();
        let mut wb = WorldBuilder::new(cb.build());
        wb.add_factory("D", Coord::new(0, 0), ty).unwrap();
        let mut sim = Simulation::new(wb.build());

        assert!(matches!(
            sim.make_user_request("door", "D"),
            Err(InvalidOperation::Unsourceable { .. })
        ));

        // With stock on hand the same request is accepted.
        let mut cb = CatalogBuilder::new();
        let wood = cb.register_item("wood").unwrap();
        let door = cb.register_item("door").unwrap();
        let door_recipe = cb.register_recipe(door, &[(wood, 1)], 5).unwrap();
        let ty = cb.register_type("carpentry", vec![door_recipe]).unwrap();
        let mut wb = WorldBuilder::new(cb.build());
        let factory = wb.add_factory("D", Coord::new(0, 0), ty).unwrap();
        wb.set_initial_stock(factory, wood, 1).unwrap();
        let mut sim = Simulation::new(wb.build());
        assert!(sim.make_user_request("door", "D").is_ok());
    }

    #[test]
    fn order_numbers_are_monotonic() {
        let mut sim = wood_door_world();
        let a = sim.make_user_request("wood", "W").unwrap();
        let b = sim.make_user_request("wood", "W").unwrap();
        assert!(a < b);
    }

    #[test]
    fn set_policy_validates_kind_name_and_target() {
        let mut sim = wood_door_world();
        sim.set_policy("request", "sjf", "D").unwrap();
        sim.set_policy("source", "recursivelat", "*").unwrap();

        assert!(matches!(
            sim.set_policy("scheduling", "sjf", "D"),
            Err(InvalidOperation::UnknownPolicyKind(_))
        ));
        assert!(matches!(
            sim.set_policy("request", "shortest", "D"),
            Err(InvalidOperation::UnknownPolicy(_))
        ));
        assert!(matches!(
            sim.set_policy("request", "sjf", "nowhere"),
            Err(InvalidOperation::BuildingNotFound(_))
        ));

        let d = sim.world().find("D").unwrap();
        assert_eq!(sim.world().get(d).unwrap().request_policy(), RequestPolicy::Sjf);
        assert_eq!(
            sim.world().get(d).unwrap().source_policy(),
            SourcePolicy::RecursiveLatency
        );
    }

    #[test]
    fn completion_is_logged_at_verbosity_zero() {
        let handle = MemoryLogger::new();
        let mut sim = {
            let mut cb = CatalogBuilder::new();
            let wood = cb.register_item("wood").unwrap();
            let rid = cb.register_recipe(wood, &[], 1).unwrap();
            let mut wb = WorldBuilder::new(cb.build());
            wb.add_mine("W", Coord::new(0, 0), rid).unwrap();
            Simulation::new(wb.build()).with_logger(Box::new(handle.clone()), 0)
        };
        sim.make_user_request("wood", "W").unwrap();
        sim.step(1);
        assert!(handle.contains("complete: wood at W"));
        // Assignment detail is gated behind verbosity 1.
        assert!(!handle.contains("queued"));
    }

    #[test]
    fn fill_target_rounds_up_and_clamps() {
        assert_eq!(fill_target(10, Fixed64::from_num(1)), 10);
        assert_eq!(fill_target(10, Fixed64::from_num(0.5)), 5);
        assert_eq!(fill_target(10, Fixed64::from_num(0.51)), 6);
        assert_eq!(fill_target(10, Fixed64::from_num(0)), 0);
        assert_eq!(fill_target(10, Fixed64::from_num(2)), 10);
        assert_eq!(fill_target(10, Fixed64::from_num(-1)), 0);
    }

    #[test]
    fn clock_advances_per_step() {
        let mut sim = wood_door_world();
        assert_eq!(sim.current_time(), 0);
        sim.step(3);
        assert_eq!(sim.current_time(), 3);
    }
}
