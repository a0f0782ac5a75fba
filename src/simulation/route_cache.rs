//! Memoised shortest-path routing over the road graph
//!
//! The road graph never changes after construction, so a stored path stays
//! valid for the lifetime of the simulation and is never invalidated.

use log::trace;
use std::collections::HashMap;

use super::error::SimError;
use super::road_graph::RoadGraph;
use super::types::Cell;

/// Cached paths keyed by `(origin, destination)`.
///
/// Paths exclude the origin and end with the destination, so `path[0]` is
/// the first cell a vehicle moves into.
#[derive(Debug, Default, Clone)]
pub struct RouteCache {
    routes: HashMap<(Cell, Cell), Vec<Cell>>,
    hits: u64,
    misses: u64,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached route or search the graph for one and remember it
    pub fn find_route(
        &mut self,
        graph: &RoadGraph,
        origin: Cell,
        destination: Cell,
    ) -> Result<&[Cell], SimError> {
        let key = (origin, destination);

        if self.routes.contains_key(&key) {
            self.hits += 1;
            return Ok(self.routes[&key].as_slice());
        }

        self.misses += 1;
        let path = graph
            .shortest_path(origin, destination)
            .ok_or(SimError::RouteNotFound { origin, destination })?;
        trace!(
            "Cached route {} -> {} ({} steps)",
            origin,
            destination,
            path.len()
        );

        Ok(self.routes.entry(key).or_insert(path).as_slice())
    }

    /// Look up a route without searching or touching the counters
    pub fn cached(&self, origin: Cell, destination: Cell) -> Option<&[Cell]> {
        self.routes.get(&(origin, destination)).map(Vec::as_slice)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
