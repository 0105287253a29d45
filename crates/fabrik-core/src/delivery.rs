//! In-flight transfers and the schedule that advances them.
//!
//! A [`Delivery`] moves goods from a source building to a destination.
//! Variants are enum-dispatched:
//!
//! - **Direct**: a travel countdown derived from the route planner;
//!   deposits exactly once on arrival, inside `finish_delivery`.
//! - **Drone**: a three-leg state machine (`ToSource → ToDestination →
//!   Returning`) that exclusively holds a [`Drone`] for its lifetime. All
//!   storage effects happen inside `step` at leg boundaries -- the pickup is
//!   deferred to the end of the first leg, the deposit happens at the end
//!   of the second, the drone returns to its port at the end of the third --
//!   so `finish_delivery` is a no-op.
//!
//! The [`DeliverySchedule`] owns every active delivery, advances all of
//! them once per tick, then finalizes and removes the ones that arrived.

use crate::building::BuildingKind;
use crate::drone::Drone;
use crate::fixed::Ticks;
use crate::id::{BuildingId, ItemId};
use crate::log::{SimLogger, V_ASSIGNMENT, Verbosity};
use crate::world::World;

/// A transfer with a plain travel countdown.
#[derive(Debug, Clone)]
pub struct DirectDelivery {
    pub source: BuildingId,
    pub destination: BuildingId,
    pub item: ItemId,
    pub quantity: u32,
    remaining: Ticks,
    deposited: bool,
}

impl DirectDelivery {
    /// Travel ticks come from the route planner; a zero-length route still
    /// takes one tick.
    pub fn new(
        source: BuildingId,
        destination: BuildingId,
        item: ItemId,
        quantity: u32,
        travel: Ticks,
    ) -> Self {
        Self {
            source,
            destination,
            item,
            quantity,
            remaining: travel.max(1),
            deposited: false,
        }
    }

    pub fn remaining(&self) -> Ticks {
        self.remaining
    }
}

/// Leg of a drone delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneLeg {
    ToSource,
    ToDestination,
    Returning,
}

/// A three-leg drone transfer. Owns its drone until the returning leg
/// hands it back to the port.
#[derive(Debug, Clone)]
pub struct DroneDelivery {
    pub port: BuildingId,
    pub source: BuildingId,
    pub destination: BuildingId,
    pub item: ItemId,
    pub quantity: u32,
    leg: DroneLeg,
    remaining: Ticks,
    drone: Option<Drone>,
    arrived: bool,
}

impl DroneDelivery {
    /// `first_leg` is the port-to-source travel time, computed at dispatch.
    pub fn new(
        port: BuildingId,
        source: BuildingId,
        destination: BuildingId,
        item: ItemId,
        quantity: u32,
        drone: Drone,
        first_leg: Ticks,
    ) -> Self {
        Self {
            port,
            source,
            destination,
            item,
            quantity,
            leg: DroneLeg::ToSource,
            remaining: first_leg.max(1),
            drone: Some(drone),
            arrived: false,
        }
    }

    pub fn leg(&self) -> DroneLeg {
        self.leg
    }

    pub fn remaining(&self) -> Ticks {
        self.remaining
    }
}

/// An active transfer, owned by the [`DeliverySchedule`].
#[derive(Debug, Clone)]
pub enum Delivery {
    Direct(DirectDelivery),
    Drone(DroneDelivery),
}

impl Delivery {
    /// Advance one tick. Drone deliveries apply their storage effects here,
    /// at leg boundaries.
    pub fn step(
        &mut self,
        world: &mut World,
        clock: Ticks,
        verbosity: Verbosity,
        logger: &mut dyn SimLogger,
    ) {
        match self {
            Delivery::Direct(d) => {
                if d.remaining > 0 {
                    d.remaining -= 1;
                }
            }
            Delivery::Drone(d) => step_drone(d, world, clock, verbosity, logger),
        }
    }

    /// Whether the transfer completed this tick and should be finalized.
    pub fn is_arrived(&self) -> bool {
        match self {
            Delivery::Direct(d) => d.remaining == 0,
            Delivery::Drone(d) => d.arrived,
        }
    }

    /// Deposit on arrival. Deposits exactly once for a direct delivery; a
    /// no-op for a drone delivery, whose effects were applied in `step`.
    pub fn finish_delivery(
        &mut self,
        world: &mut World,
        clock: Ticks,
        verbosity: Verbosity,
        logger: &mut dyn SimLogger,
    ) {
        match self {
            Delivery::Direct(d) => {
                if d.deposited {
                    return;
                }
                d.deposited = true;
                world.deposit(d.destination, d.item, d.quantity);
                if verbosity >= V_ASSIGNMENT {
                    logger.log(&format!(
                        "[{clock}] delivered {} {} to {}",
                        d.quantity,
                        world.catalog().item_name(d.item),
                        world.name_of(d.destination),
                    ));
                }
            }
            Delivery::Drone(_) => {}
        }
    }
}

fn manhattan_between(world: &World, a: BuildingId, b: BuildingId) -> u32 {
    match (world.get(a), world.get(b)) {
        (Some(a), Some(b)) => a.pos().manhattan(b.pos()),
        _ => 0,
    }
}

fn step_drone(
    d: &mut DroneDelivery,
    world: &mut World,
    clock: Ticks,
    verbosity: Verbosity,
    logger: &mut dyn SimLogger,
) {
    if d.remaining > 0 {
        d.remaining -= 1;
    }
    if d.remaining > 0 {
        return;
    }

    match d.leg {
        DroneLeg::ToSource => {
            // Pickup is deferred to this point, not done at dispatch. If the
            // goods were consumed in the meantime the drone waits at the
            // source until stock reappears.
            let picked_up = world
                .get_mut(d.source)
                .map(|b| b.storage.withdraw(d.item, d.quantity).is_ok())
                .unwrap_or(false);
            if picked_up {
                let Some(drone) = &d.drone else { return };
                d.leg = DroneLeg::ToDestination;
                d.remaining = drone.leg_ticks(manhattan_between(world, d.source, d.destination));
            }
        }
        DroneLeg::ToDestination => {
            world.deposit(d.destination, d.item, d.quantity);
            if verbosity >= V_ASSIGNMENT {
                logger.log(&format!(
                    "[{clock}] drone delivered {} {} to {}",
                    d.quantity,
                    world.catalog().item_name(d.item),
                    world.name_of(d.destination),
                ));
            }
            let Some(drone) = &d.drone else { return };
            d.leg = DroneLeg::Returning;
            d.remaining = drone.leg_ticks(manhattan_between(world, d.destination, d.port));
        }
        DroneLeg::Returning => {
            if let Some(drone) = d.drone.take() {
                let rejected = world.get_mut(d.port).and_then(|b| match &mut b.kind {
                    BuildingKind::DronePort { pool, .. } => pool.accept(drone).err(),
                    _ => None,
                });
                if let Some(rejected) = rejected
                    && verbosity >= V_ASSIGNMENT
                {
                    logger.log(&format!(
                        "[{clock}] drone {} rejected by full port {}",
                        rejected.id,
                        world.name_of(d.port),
                    ));
                }
            }
            d.arrived = true;
        }
    }
}

/// The set of active deliveries, advanced once per tick.
#[derive(Debug, Default)]
pub struct DeliverySchedule {
    active: Vec<Delivery>,
}

impl DeliverySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delivery: Delivery) {
        self.active.push(delivery);
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active(&self) -> &[Delivery] {
        &self.active
    }

    /// Advance every active delivery, then finalize (exactly one
    /// `finish_delivery`, then removal) every delivery that arrived this
    /// tick.
    pub fn step(
        &mut self,
        world: &mut World,
        clock: Ticks,
        verbosity: Verbosity,
        logger: &mut dyn SimLogger,
    ) {
        for delivery in &mut self.active {
            delivery.step(world, clock, verbosity, logger);
        }
        self.active.retain_mut(|delivery| {
            if delivery.is_arrived() {
                delivery.finish_delivery(world, clock, verbosity, logger);
                false
            } else {
                true
            }
        });
    }
}
