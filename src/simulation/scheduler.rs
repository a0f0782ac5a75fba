//! Per-tick activation order
//!
//! Lights always step before vehicles. Under the caution policy, vehicles
//! queued at merge points ("danger squares") are stepped front-to-back
//! before any other vehicle, so two vehicles converging on one cell never
//! both see it free, and a vehicle never overtakes the one blocking it.

use log::{debug, trace};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::grid::Grid;
use super::road_graph::{EdgeKind, RoadGraph};
use super::state::SimulationState;
use super::types::{Cell, Direction, VehicleId};
use super::vehicle::VehicleUpdateResult;

/// How vehicles are ordered within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPolicy {
    /// Danger-square queues first, then ordinary vehicles, then pre-danger cells
    #[default]
    Caution,
    /// Longest-lived vehicles first
    AgeFirst,
}

/// A cell where a through lane and a perpendicular turning lane meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DangerSquare {
    pub cell: Cell,
    /// Flow direction of the through lane entering the square
    pub approach: Direction,
    /// Flow direction of the turning lane entering the square
    pub turn: Direction,
}

impl DangerSquare {
    /// The cell right behind the square on its through lane
    pub fn pre_danger_cell(&self) -> Cell {
        self.cell.back(self.approach, 1)
    }
}

/// What happened during one scheduler pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    /// Vehicles in the order they were stepped
    pub order: Vec<VehicleId>,
    pub arrived: usize,
    pub stranded: usize,
}

impl Activation {
    fn record(&mut self, id: VehicleId, result: Option<VehicleUpdateResult>) {
        let Some(result) = result else {
            return;
        };
        self.order.push(id);
        match result {
            VehicleUpdateResult::Arrived { .. } => self.arrived += 1,
            VehicleUpdateResult::Stranded => self.stranded += 1,
            VehicleUpdateResult::Moved | VehicleUpdateResult::Stopped => {}
        }
    }
}

pub struct IntersectionScheduler {
    policy: SchedulerPolicy,
    danger_squares: BTreeMap<Cell, DangerSquare>,
    pre_danger: BTreeSet<Cell>,
    steps: u64,
}

impl IntersectionScheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self {
            policy,
            danger_squares: BTreeMap::new(),
            pre_danger: BTreeSet::new(),
            steps: 0,
        }
    }

    /// Register every merge point found in the road graph
    pub fn detect_danger_squares(&mut self, graph: &RoadGraph) {
        for square in find_danger_squares(graph) {
            self.register_danger_square(square);
        }
        debug!(
            "Scheduler tracks {} danger squares and {} pre-danger cells",
            self.danger_squares.len(),
            self.pre_danger.len()
        );
    }

    pub fn register_danger_square(&mut self, square: DangerSquare) {
        self.pre_danger.remove(&square.cell);
        self.danger_squares.insert(square.cell, square);

        let pre_danger = square.pre_danger_cell();
        if !self.danger_squares.contains_key(&pre_danger) {
            self.pre_danger.insert(pre_danger);
        }
    }

    pub fn danger_squares(&self) -> impl Iterator<Item = &DangerSquare> {
        self.danger_squares.values()
    }

    pub fn is_pre_danger(&self, cell: Cell) -> bool {
        self.pre_danger.contains(&cell)
    }

    pub fn policy(&self) -> SchedulerPolicy {
        self.policy
    }

    /// Ticks completed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run one tick over every light and vehicle
    pub fn step(&mut self, state: &mut SimulationState) -> Activation {
        state.step_lights();

        let activation = match self.policy {
            SchedulerPolicy::Caution => self.step_cautiously(state),
            SchedulerPolicy::AgeFirst => step_oldest_first(state),
        };

        self.steps += 1;
        trace!(
            "Tick {} activated {} vehicles",
            self.steps,
            activation.order.len()
        );
        activation
    }

    fn step_cautiously(&self, state: &mut SimulationState) -> Activation {
        let mut activation = Activation::default();
        let mut activated: HashSet<VehicleId> = HashSet::new();

        for square in self.danger_squares.values() {
            let Some(occupant) = state.grid.vehicle_at(square.cell) else {
                continue;
            };

            let mut queue = vec![occupant];
            queue.extend(queue_upstream(&state.grid, square.cell, square.approach));
            queue.extend(queue_upstream(&state.grid, square.cell, square.turn));

            for id in queue {
                if activated.insert(id) {
                    let result = state.activate_vehicle(id);
                    activation.record(id, result);
                }
            }
        }

        let mut deferred = Vec::new();
        for id in state.vehicle_ids() {
            if activated.contains(&id) {
                continue;
            }
            let on_pre_danger = state
                .vehicle(id)
                .is_some_and(|vehicle| self.is_pre_danger(vehicle.position()));
            if on_pre_danger {
                deferred.push(id);
            } else {
                let result = state.activate_vehicle(id);
                activation.record(id, result);
            }
        }

        for id in deferred {
            let result = state.activate_vehicle(id);
            activation.record(id, result);
        }

        activation
    }
}

/// Longest-lived vehicles first, ties broken by id
fn step_oldest_first(state: &mut SimulationState) -> Activation {
    let mut activation = Activation::default();
    let mut order: Vec<(u32, VehicleId)> = state
        .vehicles
        .values()
        .map(|vehicle| (vehicle.ticks_alive(), vehicle.id))
        .collect();
    order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    for (_, id) in order {
        let result = state.activate_vehicle(id);
        activation.record(id, result);
    }
    activation
}

/// Contiguous vehicles behind `square` on a lane flowing along `flow`,
/// nearest first
fn queue_upstream(grid: &Grid, square: Cell, flow: Direction) -> Vec<VehicleId> {
    let mut queue = Vec::new();
    for distance in 1.. {
        let cell = square.back(flow, distance);
        match grid.vehicle_at(cell) {
            Some(id) => queue.push(id),
            None => break,
        }
    }
    queue
}

/// Cells fed both by a straight lane and by a perpendicular lane turning in
pub fn find_danger_squares(graph: &RoadGraph) -> Vec<DangerSquare> {
    let mut squares = Vec::new();

    for cell in graph.cells() {
        let Some(facing) = graph.facing(cell) else {
            continue;
        };

        let approach = cell.back(facing, 1);
        let has_through_lane = graph.facing(approach) == Some(facing)
            && graph.edge_kind(approach, cell) == Some(EdgeKind::Straight);
        if !has_through_lane {
            continue;
        }

        let turn = [facing.turn_left(), facing.turn_right()]
            .into_iter()
            .find_map(|side| {
                let feeder = cell.step(side);
                let flow = side.reverse();
                let feeds_in = graph.facing(feeder) == Some(flow)
                    && graph.edge_kind(feeder, cell) == Some(EdgeKind::Straight);
                feeds_in.then_some(flow)
            });

        if let Some(turn) = turn {
            squares.push(DangerSquare {
                cell,
                approach: facing,
                turn,
            });
        }
    }

    squares
}
