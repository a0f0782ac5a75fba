//! Grid traffic simulation core
//!
//! Vehicles enter at the map edges, follow cached shortest paths over a
//! road graph built from the map, wait at traffic lights and behind each
//! other, and change lanes around blockages. A scheduler fixes the
//! activation order within each tick so no two vehicles ever share a cell.

mod config;
mod error;
mod grid;
mod map;
mod road_graph;
mod route_cache;
mod scheduler;
mod state;
mod stats;
mod traffic_light;
mod types;
mod vehicle;
mod views;
mod world;

pub use config::{
    DangerSquareConfig, SimConfig, DEFAULT_GREEN_DURATION, DEFAULT_HISTOGRAM_BUCKETS,
    DEFAULT_MAX_ACTIVE_VEHICLES, DEFAULT_RED_DURATION, DEFAULT_SPAWN_PROBABILITY,
};
pub use error::{ConfigError, MapDecodeError, SimError};
pub use grid::{Entity, Grid};
pub use map::{MapTokens, Token};
pub use road_graph::{EdgeKind, RoadGraph};
pub use route_cache::RouteCache;
pub use scheduler::{
    find_danger_squares, Activation, DangerSquare, IntersectionScheduler, SchedulerPolicy,
};
pub use state::SimulationState;
pub use stats::{SimulationStats, StatsSnapshot, TripHistogram};
pub use traffic_light::{LightTiming, Phase, TrafficLight};
pub use types::{Cell, Dimensions, Direction, DestinationId, LightId, ObstacleId, SimId, VehicleId};
pub use vehicle::{StepContext, Vehicle, VehicleState, VehicleUpdateResult};
pub use views::{StaticView, TickReport, TrafficLightView, VehicleView};
pub use world::SimWorld;
