//! Aggregate statistics exposed read-only to a statistics sink

use serde::Serialize;

/// Count of arrivals by trip length in ticks.
///
/// The bucket range is fixed at construction; trips at or beyond it are
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripHistogram {
    buckets: Vec<u64>,
}

impl TripHistogram {
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: vec![0; buckets],
        }
    }

    pub fn record(&mut self, ticks: u32) {
        if let Some(bucket) = self.buckets.get_mut(ticks as usize) {
            *bucket += 1;
        }
    }

    /// Arrivals that took exactly `ticks`
    pub fn count(&self, ticks: u32) -> u64 {
        self.buckets.get(ticks as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }
}

/// Running totals kept by the simulation state
#[derive(Debug, Clone)]
pub struct SimulationStats {
    pub total_spawned: u64,
    pub total_arrived: u64,
    /// Vehicles despawned because their route ran out short of the destination
    pub total_stranded: u64,
    /// Spawn attempts abandoned because the destination was unreachable
    pub total_dropped_spawns: u64,
    pub histogram: TripHistogram,
}

impl SimulationStats {
    pub fn new(histogram_buckets: usize) -> Self {
        Self {
            total_spawned: 0,
            total_arrived: 0,
            total_stranded: 0,
            total_dropped_spawns: 0,
            histogram: TripHistogram::new(histogram_buckets),
        }
    }

    pub fn record_arrival(&mut self, ticks_alive: u32) {
        self.total_arrived += 1;
        self.histogram.record(ticks_alive);
    }
}

/// Point-in-time view of the statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub tick: u64,
    pub active: usize,
    pub spawned: u64,
    pub arrived: u64,
    pub stranded: u64,
    pub dropped_spawns: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub histogram: TripHistogram,
}

impl StatsSnapshot {
    /// Share of spawned vehicles that reached their destination, in percent
    pub fn success_rate(&self) -> f64 {
        if self.spawned == 0 {
            return 0.0;
        }
        self.arrived as f64 / self.spawned as f64 * 100.0
    }
}
