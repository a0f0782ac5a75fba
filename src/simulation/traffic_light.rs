//! Fixed-cycle traffic lights

use serde::Serialize;

use super::types::{Cell, Direction, LightId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Red,
    Green,
}

/// How long each phase lasts, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightTiming {
    pub red_duration: u32,
    pub green_duration: u32,
}

/// A traffic light attached to one road cell
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    pub cell: Cell,
    /// Direction of the traffic this light controls
    pub facing: Direction,
    phase: Phase,
    /// Ticks since the last phase change
    elapsed: u32,
    timing: LightTiming,
}

impl TrafficLight {
    pub fn new(id: LightId, cell: Cell, facing: Direction, phase: Phase, timing: LightTiming) -> Self {
        Self {
            id,
            cell,
            facing,
            phase,
            elapsed: 0,
            timing,
        }
    }

    /// Advance one tick, flipping phase once the current one has run its course
    pub fn step(&mut self) {
        self.elapsed += 1;
        match self.phase {
            Phase::Red if self.elapsed >= self.timing.red_duration => {
                self.phase = Phase::Green;
                self.elapsed = 0;
            }
            Phase::Green if self.elapsed >= self.timing.green_duration => {
                self.phase = Phase::Red;
                self.elapsed = 0;
            }
            _ => {}
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_red(&self) -> bool {
        self.phase == Phase::Red
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }
}
