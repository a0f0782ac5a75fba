//! Simulation state shared by the scheduler and the clock
//!
//! Owns the grid, road graph, route cache, agents, id counter, statistics
//! and the seeded random source.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use super::config::SimConfig;
use super::error::{MapDecodeError, SimError};
use super::grid::{Entity, Grid};
use super::map::{MapTokens, Token};
use super::road_graph::RoadGraph;
use super::route_cache::RouteCache;
use super::stats::SimulationStats;
use super::traffic_light::{Phase, TrafficLight};
use super::types::{Cell, DestinationId, LightId, ObstacleId, SimId, VehicleId};
use super::vehicle::{StepContext, Vehicle, VehicleUpdateResult};

pub struct SimulationState {
    pub grid: Grid,
    pub graph: RoadGraph,
    pub routes: RouteCache,
    pub lights: BTreeMap<LightId, TrafficLight>,
    pub vehicles: BTreeMap<VehicleId, Vehicle>,
    pub obstacles: BTreeMap<ObstacleId, Cell>,
    pub destinations: BTreeMap<DestinationId, Cell>,
    pub stats: SimulationStats,
    rng: StdRng,
    next_id: usize,
}

impl SimulationState {
    /// Decode the map, build the road graph and place every static entity
    pub fn from_map(map: &MapTokens, config: &SimConfig) -> Result<Self, MapDecodeError> {
        let graph = RoadGraph::build(map)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut state = Self {
            grid: Grid::new(map.width(), map.height()),
            graph,
            routes: RouteCache::new(),
            lights: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            destinations: BTreeMap::new(),
            stats: SimulationStats::new(config.histogram_buckets),
            rng,
            next_id: 0,
        };

        for (cell, token) in map.decoded()? {
            state.place_static(cell, token, config)?;
        }

        info!(
            "Placed {} lights, {} obstacles, {} destinations on a {}x{} grid",
            state.lights.len(),
            state.obstacles.len(),
            state.destinations.len(),
            map.width(),
            map.height()
        );

        Ok(state)
    }

    fn place_static(
        &mut self,
        cell: Cell,
        token: Token,
        config: &SimConfig,
    ) -> Result<(), MapDecodeError> {
        let entities = match token {
            Token::Road(direction) => vec![Entity::Road(direction)],
            Token::Light { starts_green } => {
                let facing = self
                    .graph
                    .facing(cell)
                    .ok_or(MapDecodeError::UnresolvedLight { cell })?;
                let id = LightId(self.next_sim_id());
                let phase = if starts_green { Phase::Green } else { Phase::Red };
                self.lights.insert(
                    id,
                    TrafficLight::new(id, cell, facing, phase, config.light_timing()),
                );
                // The lane under a light carries the light's resolved direction
                vec![Entity::Light(id), Entity::Road(facing)]
            }
            Token::Obstacle => {
                let id = ObstacleId(self.next_sim_id());
                self.obstacles.insert(id, cell);
                vec![Entity::Obstacle(id)]
            }
            Token::Destination => {
                let id = DestinationId(self.next_sim_id());
                self.destinations.insert(id, cell);
                vec![Entity::Destination(id)]
            }
        };

        for entity in entities {
            self.grid
                .insert(cell, entity)
                .map_err(|_| MapDecodeError::CellOutsideGrid { cell })?;
        }
        Ok(())
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Roll the seeded random source
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability)
    }

    pub fn active_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Snapshot of live vehicle ids in id order
    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.keys().copied().collect()
    }

    /// Step every traffic light once
    pub fn step_lights(&mut self) {
        for light in self.lights.values_mut() {
            light.step();
        }
    }

    /// Step one vehicle and despawn it if it arrived or got stranded.
    ///
    /// Returns `None` if the vehicle no longer exists.
    pub fn activate_vehicle(&mut self, id: VehicleId) -> Option<VehicleUpdateResult> {
        let vehicle = self.vehicles.get_mut(&id)?;
        let mut ctx = StepContext {
            grid: &mut self.grid,
            graph: &self.graph,
            routes: &mut self.routes,
            lights: &self.lights,
        };
        let result = vehicle.step(&mut ctx);

        match result {
            VehicleUpdateResult::Arrived { ticks_alive } => {
                self.vehicles.remove(&id);
                self.stats.record_arrival(ticks_alive);
            }
            VehicleUpdateResult::Stranded => {
                self.vehicles.remove(&id);
                self.stats.total_stranded += 1;
            }
            VehicleUpdateResult::Moved | VehicleUpdateResult::Stopped => {}
        }

        Some(result)
    }

    /// Ask a vehicle to change lanes outside of its normal step
    pub fn try_change_lane(&mut self, id: VehicleId) -> Result<bool, SimError> {
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id.0 .0))?;
        let mut ctx = StepContext {
            grid: &mut self.grid,
            graph: &self.graph,
            routes: &mut self.routes,
            lights: &self.lights,
        };
        Ok(vehicle.try_change_lane(&mut ctx))
    }

    /// Spawn a vehicle at `origin` heading for a random destination
    pub fn spawn_vehicle(&mut self, origin: Cell) -> Result<VehicleId, SimError> {
        let candidates: Vec<Cell> = self.destinations.values().copied().collect();
        let destination = *candidates
            .choose(&mut self.rng)
            .ok_or(SimError::NoDestinations)?;
        self.spawn_vehicle_to(origin, destination)
    }

    /// Spawn a vehicle at `origin` heading for `destination`.
    ///
    /// A destination that cannot be reached counts as a dropped spawn and
    /// nothing is placed on the grid.
    pub fn spawn_vehicle_to(
        &mut self,
        origin: Cell,
        destination: Cell,
    ) -> Result<VehicleId, SimError> {
        if !self.grid.in_bounds(origin) {
            return Err(SimError::OutOfBounds(origin));
        }
        if self.grid.vehicle_at(origin).is_some() {
            return Err(SimError::OccupiedCell(origin));
        }
        let facing = self
            .graph
            .facing(origin)
            .ok_or(SimError::NotDrivable(origin))?;

        let route = match self.routes.find_route(&self.graph, origin, destination) {
            Ok(route) => route.to_vec(),
            Err(err) => {
                self.stats.total_dropped_spawns += 1;
                debug!("Dropping vehicle at {}: {}", origin, err);
                return Err(err);
            }
        };

        let id = VehicleId(self.next_sim_id());
        self.grid.insert(origin, Entity::Vehicle(id))?;
        self.vehicles
            .insert(id, Vehicle::new(id, origin, destination, route, facing));
        self.stats.total_spawned += 1;
        debug!("Spawned vehicle {} at {} bound for {}", id, origin, destination);

        Ok(id)
    }
}
