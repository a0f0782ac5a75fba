//! Error types for map decoding, configuration and per-vehicle operations

use thiserror::Error;

use super::types::Cell;

/// Failures while turning map tokens into a road graph.
///
/// All of these are fatal: a simulation cannot start from a map that
/// produces one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapDecodeError {
    #[error("map contains no rows")]
    EmptyMap,
    #[error("map contains no drivable cells")]
    NoRoads,
    #[error("unrecognised token {token:?} at {cell}")]
    UnknownToken { cell: Cell, token: char },
    #[error("traffic light at {cell} has no adjacent road to take its direction from")]
    UnresolvedLight { cell: Cell },
    #[error("road at {cell} has no cell it can drive into")]
    DeadEnd { cell: Cell },
    #[error("{cell} lies outside the grid")]
    CellOutsideGrid { cell: Cell },
}

/// Runtime errors scoped to a single vehicle or spawn attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("{0} is outside the grid")]
    OutOfBounds(Cell),
    #[error("no route from {origin} to {destination}")]
    RouteNotFound { origin: Cell, destination: Cell },
    #[error("{0} is already occupied by a vehicle")]
    OccupiedCell(Cell),
    #[error("{0} is not a drivable cell")]
    NotDrivable(Cell),
    #[error("map has no destinations")]
    NoDestinations,
    #[error("vehicle {0} does not exist")]
    UnknownVehicle(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be at least one tick, got {value}")]
    InvalidDuration { name: &'static str, value: u32 },
    #[error("spawn probability must be between 0.0 and 1.0, got {0}")]
    InvalidProbability(f64),
    #[error("histogram needs at least one bucket")]
    InvalidHistogram,
}
