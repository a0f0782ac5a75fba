//! Vehicle movement logic for the traffic simulation
//!
//! A vehicle follows its cached route one cell per tick, waits at red
//! lights and behind other vehicles, and sidesteps into a neighbouring lane
//! once it has been held up for a tick.

use log::{debug, trace, warn};
use std::collections::BTreeMap;

use super::grid::{Entity, Grid};
use super::road_graph::RoadGraph;
use super::route_cache::RouteCache;
use super::traffic_light::TrafficLight;
use super::types::{Cell, Direction, LightId, VehicleId};

/// Lifecycle of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    /// Created with a route but not stepped yet
    Routing,
    Moving,
    Stopped,
    /// Reached its destination and left the grid
    Arrived,
    /// Left the grid without a way to reach its destination
    Stranded,
}

/// Result of a vehicle update indicating what the owner should do with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    Moved,
    Stopped,
    /// Vehicle reached its destination after this many ticks and must be despawned
    Arrived { ticks_alive: u32 },
    /// Route ran out before the destination; vehicle must be despawned
    Stranded,
}

/// Shared simulation state a vehicle reads and writes while stepping
pub struct StepContext<'a> {
    pub grid: &'a mut Grid,
    pub graph: &'a RoadGraph,
    pub routes: &'a mut RouteCache,
    pub lights: &'a BTreeMap<LightId, TrafficLight>,
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    position: Cell,
    destination: Cell,
    route: Vec<Cell>,
    route_index: usize,
    ticks_stopped: u32,
    ticks_alive: u32,
    facing: Direction,
    state: VehicleState,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        position: Cell,
        destination: Cell,
        route: Vec<Cell>,
        facing: Direction,
    ) -> Self {
        Self {
            id,
            position,
            destination,
            route,
            route_index: 0,
            ticks_stopped: 0,
            ticks_alive: 0,
            facing,
            state: VehicleState::Routing,
        }
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn destination(&self) -> Cell {
        self.destination
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn ticks_alive(&self) -> u32 {
        self.ticks_alive
    }

    pub fn ticks_stopped(&self) -> u32 {
        self.ticks_stopped
    }

    /// Cells still to drive through, next cell first
    pub fn remaining_route(&self) -> &[Cell] {
        self.route.get(self.route_index..).unwrap_or(&[])
    }

    fn next_cell(&self) -> Option<Cell> {
        self.route.get(self.route_index).copied()
    }

    fn entity(&self) -> Entity {
        Entity::Vehicle(self.id)
    }

    /// Advance the vehicle by one tick
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> VehicleUpdateResult {
        if self.position == self.destination {
            ctx.grid.remove(self.position, self.entity());
            self.state = VehicleState::Arrived;
            debug!(
                "Vehicle {} arrived at {} after {} ticks",
                self.id, self.destination, self.ticks_alive
            );
            return VehicleUpdateResult::Arrived {
                ticks_alive: self.ticks_alive,
            };
        }

        let Some(next) = self.next_cell() else {
            ctx.grid.remove(self.position, self.entity());
            self.state = VehicleState::Stranded;
            warn!(
                "Vehicle {} ran out of route at {} short of {}",
                self.id, self.position, self.destination
            );
            return VehicleUpdateResult::Stranded;
        };

        let moved = self.try_advance(next, ctx);
        if moved {
            self.ticks_stopped = 0;
            self.state = VehicleState::Moving;
        } else {
            self.ticks_stopped += 1;
            self.state = VehicleState::Stopped;
        }
        self.ticks_alive += 1;

        if moved {
            VehicleUpdateResult::Moved
        } else {
            VehicleUpdateResult::Stopped
        }
    }

    /// Try to move into `next`, changing lanes if it is taken
    fn try_advance(&mut self, next: Cell, ctx: &mut StepContext<'_>) -> bool {
        self.face_towards(next);

        if self.held_by_light(ctx) {
            trace!("Vehicle {} waiting at red light {}", self.id, self.position);
            return false;
        }

        let mut target = next;
        if ctx.grid.vehicle_at(target).is_some() {
            if self.ticks_stopped < 1 || !self.try_change_lane(ctx) {
                return false;
            }
            match self.next_cell() {
                Some(cell) if ctx.grid.vehicle_at(cell).is_none() => target = cell,
                _ => return false,
            }
        }

        if let Err(err) = ctx.grid.move_entity(self.entity(), self.position, target) {
            warn!("Vehicle {} could not move: {}", self.id, err);
            return false;
        }
        self.position = target;
        self.route_index += 1;
        true
    }

    /// Sidestep diagonally into a free neighbouring lane.
    ///
    /// The first free candidate for the current facing wins; its route is
    /// `[candidate] + route(candidate, destination)`. Returns false when no
    /// candidate is usable, leaving the route untouched.
    pub fn try_change_lane(&mut self, ctx: &mut StepContext<'_>) -> bool {
        for (dx, dy) in self.facing.lane_change_offsets() {
            let candidate = self.position.offset(dx, dy);
            if !ctx.grid.in_bounds(candidate) || ctx.grid.blocks_lane_change(candidate) {
                continue;
            }

            let Ok(onward) = ctx.routes.find_route(ctx.graph, candidate, self.destination) else {
                continue;
            };

            let mut route = Vec::with_capacity(onward.len() + 1);
            route.push(candidate);
            route.extend_from_slice(onward);
            self.route = route;
            self.route_index = 0;
            debug!(
                "Vehicle {} changing lane {} -> {}",
                self.id, self.position, candidate
            );
            return true;
        }
        false
    }

    /// Whether a red light on the current cell holds the vehicle
    fn held_by_light(&self, ctx: &StepContext<'_>) -> bool {
        ctx.grid
            .light_at(self.position)
            .and_then(|id| ctx.lights.get(&id))
            .is_some_and(TrafficLight::is_red)
    }

    /// Face along a straight move; diagonal lane-change moves keep the
    /// current facing
    fn face_towards(&mut self, next: Cell) {
        if let Some(direction) =
            Direction::from_offset(next.x - self.position.x, next.y - self.position.y)
        {
            self.facing = direction;
        }
    }
}
