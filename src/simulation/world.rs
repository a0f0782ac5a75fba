//! Main simulation world that ties everything together
//!
//! `SimWorld` is the simulation clock: it owns the state and the scheduler,
//! advances ticks, spawns vehicles at the entry points and answers the
//! queries a transport layer or statistics sink needs.

use anyhow::{Context, Result};
use log::{debug, info, warn};

use super::config::SimConfig;
use super::error::SimError;
use super::grid::Entity;
use super::map::MapTokens;
use super::scheduler::{DangerSquare, IntersectionScheduler};
use super::state::SimulationState;
use super::stats::StatsSnapshot;
use super::traffic_light::Phase;
use super::types::{Cell, Dimensions, VehicleId};
use super::vehicle::{Vehicle, VehicleUpdateResult};
use super::views::{StaticView, TickReport, TrafficLightView, VehicleView};

/// The main simulation world
pub struct SimWorld {
    state: SimulationState,
    scheduler: IntersectionScheduler,
    config: SimConfig,
    /// Cells where new vehicles enter the grid
    spawn_points: Vec<Cell>,
}

impl SimWorld {
    /// Build a world from decoded map tokens.
    ///
    /// Fails if the configuration is invalid or the map cannot be turned
    /// into a road graph.
    pub fn from_map(map: &MapTokens, config: SimConfig) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;
        let state = SimulationState::from_map(map, &config)
            .context("Failed to build road network from map")?;

        let mut scheduler = IntersectionScheduler::new(config.policy);
        if config.detect_danger_squares {
            scheduler.detect_danger_squares(&state.graph);
        }
        for square in &config.danger_squares {
            scheduler.register_danger_square(DangerSquare {
                cell: square.cell,
                approach: square.approach,
                turn: square.turn,
            });
        }

        let spawn_points = match &config.spawn_points {
            Some(points) => points.clone(),
            None => border_entry_points(&state),
        };

        info!(
            "Simulation ready: {}x{} grid, {} spawn points, {} danger squares",
            map.width(),
            map.height(),
            spawn_points.len(),
            scheduler.danger_squares().count()
        );

        Ok(Self {
            state,
            scheduler,
            config,
            spawn_points,
        })
    }

    /// Parse map text and build a world from it
    pub fn from_map_str(text: &str, config: SimConfig) -> Result<Self> {
        let map = MapTokens::parse(text).context("Failed to parse map")?;
        Self::from_map(&map, config)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.state.grid.width(),
            height: self.state.grid.height(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn scheduler(&self) -> &IntersectionScheduler {
        &self.scheduler
    }

    pub fn spawn_points(&self) -> &[Cell] {
        &self.spawn_points
    }

    /// Ticks completed so far
    pub fn tick(&self) -> u64 {
        self.scheduler.steps()
    }

    /// Advance the simulation by one tick: lights and vehicles are stepped by
    /// the scheduler, then new vehicles enter at the spawn points
    pub fn step(&mut self) -> TickReport {
        let activation = self.scheduler.step(&mut self.state);
        let (spawned, dropped_spawns) = self.spawn_vehicles();

        TickReport {
            tick: self.scheduler.steps(),
            spawned,
            arrived: activation.arrived,
            stranded: activation.stranded,
            dropped_spawns,
            active: self.state.active_count(),
            activation_order: activation.order,
        }
    }

    /// Each spawn point independently rolls for a new vehicle
    fn spawn_vehicles(&mut self) -> (usize, usize) {
        let mut spawned = 0;
        let mut dropped = 0;

        for index in 0..self.spawn_points.len() {
            if let Some(max) = self.config.max_active_vehicles {
                if self.state.active_count() >= max {
                    break;
                }
            }
            if !self.state.chance(self.config.spawn_probability) {
                continue;
            }

            let origin = self.spawn_points[index];
            match self.state.spawn_vehicle(origin) {
                Ok(_) => spawned += 1,
                Err(SimError::OccupiedCell(_)) => {}
                Err(SimError::RouteNotFound { .. }) => dropped += 1,
                Err(err) => warn!("Could not spawn at {}: {}", origin, err),
            }
        }

        if spawned > 0 {
            debug!("Spawned {} vehicles at tick {}", spawned, self.tick());
        }
        (spawned, dropped)
    }

    /// Spawn a vehicle at `origin` bound for `destination`
    pub fn spawn_vehicle_at(&mut self, origin: Cell, destination: Cell) -> Result<VehicleId, SimError> {
        self.state.spawn_vehicle_to(origin, destination)
    }

    /// Step a single vehicle outside the scheduler
    pub fn activate_vehicle(&mut self, id: VehicleId) -> Option<VehicleUpdateResult> {
        self.state.activate_vehicle(id)
    }

    pub fn try_change_lane(&mut self, id: VehicleId) -> Result<bool, SimError> {
        self.state.try_change_lane(id)
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.state.vehicle(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.state.vehicles.values()
    }

    pub fn query_vehicles(&self) -> Vec<VehicleView> {
        self.state
            .vehicles
            .values()
            .map(|vehicle| VehicleView {
                id: vehicle.id.0 .0,
                x: vehicle.position().x,
                z: vehicle.position().y,
                facing: vehicle.facing(),
            })
            .collect()
    }

    pub fn query_traffic_lights(&self) -> Vec<TrafficLightView> {
        self.state
            .lights
            .values()
            .map(|light| TrafficLightView {
                id: light.id.0 .0,
                x: light.cell.x,
                z: light.cell.y,
                facing: light.facing,
                phase: light.phase(),
            })
            .collect()
    }

    pub fn query_obstacles(&self) -> Vec<StaticView> {
        self.state
            .obstacles
            .iter()
            .map(|(id, cell)| StaticView {
                id: id.0 .0,
                x: cell.x,
                z: cell.y,
            })
            .collect()
    }

    pub fn query_destinations(&self) -> Vec<StaticView> {
        self.state
            .destinations
            .iter()
            .map(|(id, cell)| StaticView {
                id: id.0 .0,
                x: cell.x,
                z: cell.y,
            })
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let stats = &self.state.stats;
        StatsSnapshot {
            tick: self.tick(),
            active: self.state.active_count(),
            spawned: stats.total_spawned,
            arrived: stats.total_arrived,
            stranded: stats.total_stranded,
            dropped_spawns: stats.total_dropped_spawns,
            cache_hits: self.state.routes.hits(),
            cache_misses: self.state.routes.misses(),
            histogram: stats.histogram.clone(),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let stats = self.stats();
        println!("=== Traffic Simulation Summary ===");
        println!("Tick: {}", stats.tick);
        println!(
            "Drivable cells: {}, Edges: {}, Lights: {}",
            self.state.graph.cell_count(),
            self.state.graph.edge_count(),
            self.state.lights.len()
        );
        println!(
            "Active: {}, Spawned: {}, Arrived: {}, Stranded: {}, Dropped spawns: {}",
            stats.active, stats.spawned, stats.arrived, stats.stranded, stats.dropped_spawns
        );
        println!(
            "Route cache: {} routes, {} hits, {} misses",
            self.state.routes.len(),
            stats.cache_hits,
            stats.cache_misses
        );

        let red = self
            .state
            .lights
            .values()
            .filter(|light| light.phase() == Phase::Red)
            .count();
        println!("Lights red/green: {}/{}", red, self.state.lights.len() - red);
    }

    /// Render the grid as text, top row first
    pub fn render_map(&self) -> String {
        let grid = &self.state.grid;
        let mut out = String::new();

        for y in (0..grid.height()).rev() {
            for x in 0..grid.width() {
                let cell = Cell::new(x, y);
                let contents = grid.contents(cell);
                let symbol = if grid.vehicle_at(cell).is_some() {
                    'C'
                } else if let Some(id) = grid.light_at(cell) {
                    match self.state.lights.get(&id).map(|light| light.phase()) {
                        Some(Phase::Green) => 'G',
                        _ => 'R',
                    }
                } else {
                    contents
                        .iter()
                        .find_map(|entity| match entity {
                            Entity::Road(direction) => Some(direction.token()),
                            Entity::Obstacle(_) => Some('#'),
                            Entity::Destination(_) => Some('D'),
                            _ => None,
                        })
                        .unwrap_or(' ')
                };
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: C=Vehicle, R/G=Light, D=Destination, #=Obstacle, ^v<>=Road");
        println!();
        print!("{}", self.render_map());
        println!();
    }
}

/// Road cells on the map border; lights never act as entry points
fn border_entry_points(state: &SimulationState) -> Vec<Cell> {
    let width = state.grid.width();
    let height = state.grid.height();

    state
        .graph
        .cells()
        .filter(|cell| cell.x == 0 || cell.y == 0 || cell.x == width - 1 || cell.y == height - 1)
        .filter(|cell| state.grid.light_at(*cell).is_none())
        .collect()
}
