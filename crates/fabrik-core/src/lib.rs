//! Fabrik Core -- the production-scheduling and delivery engine for a
//! tick-based factory simulation.
//!
//! Buildings hold a storage ledger and pending demand ("requests"); each
//! tick, pluggable policies decide which request a building works on and
//! which upstream building supplies a missing ingredient; completed
//! production spawns a transfer ("delivery", including a three-leg drone
//! variant) that eventually deposits goods at its destination.
//!
//! # Tick Pipeline
//!
//! Each call to [`sim::Simulation::step`] advances the simulation by one
//! tick:
//!
//! 1. **Buildings** -- every building steps once, in registration order.
//!    Stores promote arriving stock and issue replenishment demand, waste
//!    disposals advance their processing batch, producers run the
//!    production step: request selection via [`policy::RequestPolicy`],
//!    one-shot ingredient sourcing via [`source_policy::SourcePolicy`],
//!    countdown, completion.
//! 2. **Deliveries** -- the [`delivery::DeliverySchedule`] advances every
//!    in-flight transfer, then finalizes the ones that arrived.
//!
//! # Resource Accounting
//!
//! Storage ledgers never go negative and never hold a zero entry. A
//! completed request deposits exactly one output unit exactly once. A
//! [`drone::Drone`] is owned by exactly one of its port's pool or one
//! in-flight delivery at any instant. The recursive source estimator
//! tracks claims in a per-call [`usage::UsageLedger`] so two sibling
//! branches of one selection can never count the same unit twice.
//!
//! # Key Types
//!
//! - [`sim::Simulation`] -- tick loop and the mutating driver entry points.
//! - [`world::World`] / [`world::WorldBuilder`] -- the pre-validated
//!   building graph.
//! - [`catalog::Catalog`] -- immutable items, recipes, and factory types.
//! - [`building::Building`] -- shared ledger/queue bookkeeping plus the
//!   closed variant set (mine, factory, store, waste disposal, drone port).
//! - [`policy::RequestPolicy`] -- FIFO / SJF / Ready request selection.
//! - [`source_policy::SourcePolicy`] -- queue-length / simple-latency /
//!   recursive-latency source selection.
//! - [`delivery::Delivery`] -- direct and drone transfers.
//! - [`error::InvalidOperation`] -- the single error taxonomy.

pub mod building;
pub mod catalog;
pub mod delivery;
pub mod drone;
pub mod error;
pub mod fixed;
pub mod id;
pub mod log;
pub mod policy;
pub mod request;
pub mod route;
pub mod sim;
pub mod source_policy;
pub mod storage;
pub mod usage;
pub mod waste;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
