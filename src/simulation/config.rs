//! Simulation configuration
//!
//! Every field has a default, so a JSON config file only needs to name the
//! values it changes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::error::ConfigError;
use super::scheduler::SchedulerPolicy;
use super::traffic_light::LightTiming;
use super::types::{Cell, Direction};

/// Default ticks a light stays red
pub const DEFAULT_RED_DURATION: u32 = 7;
/// Default ticks a light stays green
pub const DEFAULT_GREEN_DURATION: u32 = 6;
/// Default chance per spawn point per tick of a new vehicle
pub const DEFAULT_SPAWN_PROBABILITY: f64 = 0.1;
/// Default cap on vehicles on the grid before spawning pauses
pub const DEFAULT_MAX_ACTIVE_VEHICLES: usize = 32;
/// Default number of trip-length histogram buckets
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 256;

/// A danger square registered by hand rather than detected from the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DangerSquareConfig {
    pub cell: Cell,
    /// Flow direction of the through lane entering the square
    pub approach: Direction,
    /// Flow direction of the turning lane entering the square
    pub turn: Direction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for destination choice and spawning; `None` seeds from the OS
    pub seed: Option<u64>,
    pub red_duration: u32,
    pub green_duration: u32,
    pub spawn_probability: f64,
    /// Spawning pauses while this many vehicles are on the grid; `None`
    /// lets the map fill up
    pub max_active_vehicles: Option<usize>,
    /// Trip lengths at or beyond this are not recorded in the histogram
    pub histogram_buckets: usize,
    pub policy: SchedulerPolicy,
    /// Detect merge points from the road graph at startup
    pub detect_danger_squares: bool,
    pub danger_squares: Vec<DangerSquareConfig>,
    /// Entry cells; `None` uses every road cell on the map border
    pub spawn_points: Option<Vec<Cell>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            red_duration: DEFAULT_RED_DURATION,
            green_duration: DEFAULT_GREEN_DURATION,
            spawn_probability: DEFAULT_SPAWN_PROBABILITY,
            max_active_vehicles: Some(DEFAULT_MAX_ACTIVE_VEHICLES),
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            policy: SchedulerPolicy::default(),
            detect_danger_squares: true,
            danger_squares: Vec::new(),
            spawn_points: None,
        }
    }
}

impl SimConfig {
    /// Default configuration with a fixed seed for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Read a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.red_duration == 0 {
            return Err(ConfigError::InvalidDuration {
                name: "red_duration",
                value: self.red_duration,
            });
        }
        if self.green_duration == 0 {
            return Err(ConfigError::InvalidDuration {
                name: "green_duration",
                value: self.green_duration,
            });
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::InvalidProbability(self.spawn_probability));
        }
        if self.histogram_buckets == 0 {
            return Err(ConfigError::InvalidHistogram);
        }
        Ok(())
    }

    pub fn light_timing(&self) -> LightTiming {
        LightTiming {
            red_duration: self.red_duration,
            green_duration: self.green_duration,
        }
    }
}
