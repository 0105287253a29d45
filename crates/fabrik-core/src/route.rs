//! Boundary to the tile-map pathfinding collaborator.
//!
//! The core never walks the map itself: a [`RoutePlanner`] turns a pair of
//! coordinates into a route length (or no route), and direct-delivery travel
//! time derives from that length. Drone legs bypass the planner entirely and
//! use raw Manhattan distance.

use serde::{Deserialize, Serialize};

/// A position on the tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate.
    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// A route found by the pathfinding collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Number of tiles along the route. Direct-delivery travel ticks are
    /// `max(1, length)`.
    pub length: u32,
    /// Tiles the route would newly claim on the map. Observability only.
    pub new_tiles: u32,
}

/// Pathfinding boundary. Implementations are supplied by the caller; the
/// crate ships [`ManhattanPlanner`] as the default.
pub trait RoutePlanner {
    /// Returns the route between two coordinates, or `None` when no route
    /// exists.
    fn route(&self, from: Coord, to: Coord) -> Option<Route>;
}

/// Planner that assumes an unobstructed map: every pair of coordinates is
/// connected by a route of Manhattan length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanPlanner;

impl RoutePlanner for ManhattanPlanner {
    fn route(&self, from: Coord, to: Coord) -> Option<Route> {
        Some(Route {
            length: from.manhattan(to),
            new_tiles: 0,
        })
    }
}
