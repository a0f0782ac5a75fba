//! Road network graph for pathfinding
//!
//! Built once from the map tokens by a breadth-first traversal over the
//! drivable cells and immutable afterwards.

use log::{debug, info};
use petgraph::algo::astar;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use super::error::MapDecodeError;
use super::map::{MapTokens, Token};
use super::types::{Cell, Direction};

/// How a vehicle gets from one cell to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Continue in the facing direction
    Straight,
    /// Sidestep into a parallel lane, a turning lane or a destination
    Lateral,
}

/// Order in which a light looks for its facing: right, left, below, above neighbour.
/// Each entry names the cell a vehicle would come from.
const LIGHT_FACING_ORDER: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

/// Directed adjacency graph over drivable cells
#[derive(Debug, Clone)]
pub struct RoadGraph {
    /// Outgoing edges of each cell in insertion order, straight-ahead first
    graph: DiGraphMap<Cell, EdgeKind>,
    /// Resolved facing of every drivable cell, lights included
    facings: BTreeMap<Cell, Direction>,
    /// Destination cells reached by the traversal
    destinations: BTreeSet<Cell>,
    width: i32,
    height: i32,
}

impl RoadGraph {
    /// Decode the map and build the adjacency graph
    pub fn build(map: &MapTokens) -> Result<Self, MapDecodeError> {
        let mut graph = DiGraphMap::new();
        let mut facings = BTreeMap::new();
        let mut destinations = BTreeSet::new();
        let mut visited: HashSet<Cell> = HashSet::new();
        let mut queue = VecDeque::new();

        let decoded = map.decoded()?;
        let seeds: Vec<Cell> = decoded
            .iter()
            .filter(|(_, token)| token.is_drivable())
            .map(|(cell, _)| *cell)
            .collect();

        if seeds.is_empty() {
            return Err(MapDecodeError::NoRoads);
        }

        for seed in seeds {
            if !visited.insert(seed) {
                continue;
            }
            queue.push_back(seed);

            while let Some(cell) = queue.pop_front() {
                let facing = match map.token_at(cell)? {
                    Some(Token::Road(direction)) => direction,
                    Some(Token::Light { .. }) => resolve_light_facing(map, cell)?,
                    Some(Token::Destination) => {
                        destinations.insert(cell);
                        continue;
                    }
                    _ => continue,
                };
                facings.insert(cell, facing);

                let edges = outgoing_edges(map, cell, facing)?;
                if edges.is_empty() {
                    return Err(MapDecodeError::DeadEnd { cell });
                }

                for (next, kind) in edges {
                    graph.add_edge(cell, next, kind);
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        info!(
            "Built road graph: {} drivable cells, {} edges, {} destinations",
            facings.len(),
            graph.edge_count(),
            destinations.len()
        );

        Ok(Self {
            graph,
            facings,
            destinations,
            width: map.width(),
            height: map.height(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `cell` has outgoing edges (destinations never do)
    pub fn contains(&self, cell: Cell) -> bool {
        self.graph.neighbors(cell).next().is_some()
    }

    /// Reachable neighbours of a cell, straight-ahead first
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.graph.neighbors(cell)
    }

    /// The straight-ahead neighbour of a cell
    pub fn straight_ahead(&self, cell: Cell) -> Option<Cell> {
        self.graph
            .neighbors(cell)
            .find(|next| self.edge_kind(cell, *next) == Some(EdgeKind::Straight))
    }

    pub fn edge_kind(&self, from: Cell, to: Cell) -> Option<EdgeKind> {
        self.graph.edge_weight(from, to).copied()
    }

    pub fn has_edge(&self, from: Cell, to: Cell) -> bool {
        self.graph.contains_edge(from, to)
    }

    /// Facing of a drivable cell; for lights this is the resolved direction
    pub fn facing(&self, cell: Cell) -> Option<Direction> {
        self.facings.get(&cell).copied()
    }

    /// Drivable cells in ascending cell order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.facings.keys().copied()
    }

    pub fn destinations(&self) -> &BTreeSet<Cell> {
        &self.destinations
    }

    pub fn cell_count(&self) -> usize {
        self.facings.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Finds a minimum-hop path using A* (Dijkstra with null heuristic).
    ///
    /// The returned cells exclude `origin` and end with `destination`.
    pub fn shortest_path(&self, origin: Cell, destination: Cell) -> Option<Vec<Cell>> {
        if origin == destination {
            return Some(vec![]);
        }

        let (_, cells) = astar(
            &self.graph,
            origin,
            |cell| cell == destination,
            |_| 1u32,
            |_| 0,
        )?;

        Some(cells.into_iter().skip(1).collect())
    }

    /// Full adjacency mapping, ordered by cell
    pub fn adjacency(&self) -> BTreeMap<Cell, Vec<Cell>> {
        self.facings
            .keys()
            .map(|cell| (*cell, self.graph.neighbors(*cell).collect()))
            .collect()
    }
}

/// Take a light's facing from the road feeding into it
fn resolve_light_facing(map: &MapTokens, cell: Cell) -> Result<Direction, MapDecodeError> {
    for facing in LIGHT_FACING_ORDER {
        let upstream = cell.back(facing, 1);
        if map.char_at(upstream) == Some(facing.token()) {
            debug!("Light at {} faces {}", cell, facing);
            return Ok(facing);
        }
    }
    Err(MapDecodeError::UnresolvedLight { cell })
}

/// Straight-ahead edge followed by the legal lateral edges
fn outgoing_edges(
    map: &MapTokens,
    cell: Cell,
    facing: Direction,
) -> Result<Vec<(Cell, EdgeKind)>, MapDecodeError> {
    let mut edges = Vec::with_capacity(3);

    let ahead = cell.step(facing);
    if let Some(token) = map.token_at(ahead)? {
        if token != Token::Obstacle {
            edges.push((ahead, EdgeKind::Straight));
        }
    }

    for side in [facing.turn_left(), facing.turn_right()] {
        let lateral = cell.step(side);
        let Some(token) = map.token_at(lateral)? else {
            continue;
        };
        if accepts_lateral(map, lateral, token, facing, side)? {
            edges.push((lateral, EdgeKind::Lateral));
        }
    }

    Ok(edges)
}

/// Allowed incoming tokens for a side cell: a parallel lane, a lane turning
/// away along `side`, or a destination
fn accepts_lateral(
    map: &MapTokens,
    lateral: Cell,
    token: Token,
    facing: Direction,
    side: Direction,
) -> Result<bool, MapDecodeError> {
    let accepted = match token {
        Token::Road(direction) => direction == facing || direction == side,
        Token::Light { .. } => {
            let direction = resolve_light_facing(map, lateral)?;
            direction == facing || direction == side
        }
        Token::Destination => true,
        Token::Obstacle => false,
    };
    Ok(accepted)
}
