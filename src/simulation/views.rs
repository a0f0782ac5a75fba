//! Read-only views handed to a transport layer
//!
//! Coordinates are grid cells; the map's `y` is reported as `z` to match a
//! ground-plane rendering client.

use serde::Serialize;

use super::traffic_light::Phase;
use super::types::{Direction, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleView {
    pub id: usize,
    pub x: i32,
    pub z: i32,
    pub facing: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficLightView {
    pub id: usize,
    pub x: i32,
    pub z: i32,
    pub facing: Direction,
    pub phase: Phase,
}

/// Position of a static entity such as an obstacle or destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticView {
    pub id: usize,
    pub x: i32,
    pub z: i32,
}

/// Outcome of one call to `SimWorld::step`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Vehicles placed on the grid after the scheduler pass
    pub spawned: usize,
    pub arrived: usize,
    /// Vehicles despawned mid-route because their route ran out
    pub stranded: usize,
    /// Spawn attempts dropped because the chosen destination was unreachable
    pub dropped_spawns: usize,
    pub active: usize,
    /// Vehicle ids in activation order
    #[serde(skip)]
    pub activation_order: Vec<VehicleId>,
}
