//! Spatial index of entities by cell
//!
//! Every cell holds the list of entities standing on it. Static entities
//! (roads, lights, obstacles, destinations) are placed once at construction;
//! vehicles are inserted, moved and removed as they drive.

use super::error::SimError;
use super::types::{Cell, DestinationId, Direction, LightId, ObstacleId, VehicleId};

/// Anything that can occupy a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Drivable lane carrying traffic in one direction
    Road(Direction),
    Light(LightId),
    Obstacle(ObstacleId),
    Destination(DestinationId),
    Vehicle(VehicleId),
}

impl Entity {
    /// Entities a vehicle may not change lanes into
    pub fn blocks_lane_change(&self) -> bool {
        matches!(
            self,
            Entity::Vehicle(_) | Entity::Obstacle(_) | Entity::Light(_) | Entity::Destination(_)
        )
    }
}

/// Bounded grid of entity lists
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Entity>>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![Vec::new(); size],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Result<usize, SimError> {
        if !self.in_bounds(cell) {
            return Err(SimError::OutOfBounds(cell));
        }
        Ok((cell.y * self.width + cell.x) as usize)
    }

    /// Place an entity on a cell
    pub fn insert(&mut self, cell: Cell, entity: Entity) -> Result<(), SimError> {
        let index = self.index(cell)?;
        self.cells[index].push(entity);
        Ok(())
    }

    /// Remove an entity from a cell, returning whether it was there
    pub fn remove(&mut self, cell: Cell, entity: Entity) -> bool {
        let Ok(index) = self.index(cell) else {
            return false;
        };
        let contents = &mut self.cells[index];
        match contents.iter().position(|e| *e == entity) {
            Some(pos) => {
                contents.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Move an entity between cells. The entity is left untouched if the
    /// target is out of bounds.
    pub fn move_entity(&mut self, entity: Entity, from: Cell, to: Cell) -> Result<(), SimError> {
        let to_index = self.index(to)?;
        self.remove(from, entity);
        self.cells[to_index].push(entity);
        Ok(())
    }

    /// Entities on a cell; empty outside the grid
    pub fn contents(&self, cell: Cell) -> &[Entity] {
        match self.index(cell) {
            Ok(index) => &self.cells[index],
            Err(_) => &[],
        }
    }

    pub fn vehicle_at(&self, cell: Cell) -> Option<VehicleId> {
        self.contents(cell).iter().find_map(|entity| match entity {
            Entity::Vehicle(id) => Some(*id),
            _ => None,
        })
    }

    pub fn light_at(&self, cell: Cell) -> Option<LightId> {
        self.contents(cell).iter().find_map(|entity| match entity {
            Entity::Light(id) => Some(*id),
            _ => None,
        })
    }

    /// Whether a lane change into `cell` is ruled out by what stands there
    pub fn blocks_lane_change(&self, cell: Cell) -> bool {
        self.contents(cell).iter().any(Entity::blocks_lane_change)
    }

    /// Every cell holding a vehicle together with that vehicle
    pub fn vehicles(&self) -> impl Iterator<Item = (Cell, VehicleId)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(index, contents)| {
            let cell = Cell::new(index as i32 % self.width, index as i32 / self.width);
            contents.iter().filter_map(move |entity| match entity {
                Entity::Vehicle(id) => Some((cell, *id)),
                _ => None,
            })
        })
    }
}
