use serde::{Deserialize, Serialize};

/// A drone. An owned resource handle: at any instant it lives either in its
/// port's pool or inside exactly one in-flight drone delivery, moved between
/// the two, never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drone {
    pub id: u32,
    /// Tiles per tick on every leg. Always positive.
    pub speed: u32,
}

impl Drone {
    pub fn new(id: u32, speed: u32) -> Self {
        Self {
            id,
            speed: speed.max(1),
        }
    }

    /// Travel time for a leg of the given Manhattan distance:
    /// `max(1, ceil(distance / speed))`.
    pub fn leg_ticks(&self, distance: u32) -> u64 {
        u64::from(distance.div_ceil(self.speed)).max(1)
    }
}

/// A port's bounded drone pool. Checkout moves a drone out; acceptance is
/// capacity-bounded and hands the drone back on rejection so the caller
/// decides its fate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DronePool {
    fleet: Vec<Drone>,
    capacity: usize,
}

impl DronePool {
    /// A pool holding `count` drones of uniform speed; capacity equals the
    /// initial fleet size.
    pub fn new(count: usize, speed: u32) -> Self {
        Self {
            fleet: (0..count).map(|i| Drone::new(i as u32, speed)).collect(),
            capacity: count,
        }
    }

    pub fn available(&self) -> usize {
        self.fleet.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take a drone out of the pool, transferring ownership to the caller.
    pub fn checkout(&mut self) -> Option<Drone> {
        self.fleet.pop()
    }

    /// Return a drone to the pool. `Err` hands the drone back when the pool
    /// is already at capacity; normally the slot just vacated guarantees
    /// acceptance.
    pub fn accept(&mut self, drone: Drone) -> Result<(), Drone> {
        if self.fleet.len() >= self.capacity {
            return Err(drone);
        }
        self.fleet.push(drone);
        Ok(())
    }
}
