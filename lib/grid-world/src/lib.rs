/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

#![warn(missing_docs)]

//! Multi-occupancy rectangular grid for agent simulations.
//!
//! The grid owns one clean/dirty cell state per coordinate and tracks the
//! positions of all agents moving over it. Several agents may share a
//! coordinate. Neighborhoods are Moore (8-connected), either bounded at the
//! edges or wrapping around both axes.

use serde::{Deserialize, Serialize};

/// Agents are identified by dense integer ids assigned at construction.
pub type AgentId = usize;

type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Grid error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Target coordinate is outside the grid on a bounded topology.
    #[error("coordinate is out of bounds: {0}")]
    OutOfBounds(Coordinate),

    /// The agent id was never placed on this grid.
    #[error("unknown agent id: {0}")]
    UnknownAgent(AgentId),
}

/// Position on the grid. `0 <= x < width`, `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Column, counted from the left.
    pub x: usize,

    /// Row, counted from the top.
    pub y: usize,
}

impl Coordinate {
    /// Create a coordinate.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// State of a single cell. Cells only ever transition Dirty -> Clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Nothing left to clean here.
    Clean,

    /// The cell still needs cleaning.
    Dirty,
}

/// Edge behavior of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// Edges are hard boundaries; moves past them are rejected.
    Bounded,

    /// Both axes wrap around (torus); moves past an edge re-enter on the
    /// opposite side.
    Toroidal,
}

/// Rectangular grid holding exactly one [`CellState`] per coordinate and the
/// current position of every agent.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    topology: Topology,
    cells: Vec<CellState>,
    agent_positions: HashMap<AgentId, Coordinate>,
}

impl Grid {
    /// Create a grid with every cell clean and no agents placed.
    ///
    /// Callers are expected to pass validated non-zero dimensions; a
    /// zero-sized grid has no coordinates and every lookup panics.
    pub fn new(width: usize, height: usize, topology: Topology) -> Self {
        Self {
            width,
            height,
            topology,
            cells: vec![CellState::Clean; width * height],
            agent_positions: HashMap::default(),
        }
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Edge behavior.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Whether the coordinate is inside the grid.
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coordinate) -> usize {
        // An out-of-range x with a small y would otherwise flatten onto a
        // different row's cell and corrupt counts without detection.
        assert!(
            self.contains(coord),
            "coordinate is out of bounds: {}",
            coord
        );
        coord.y * self.width + coord.x
    }

    /// Resolve a target coordinate for the grid's topology: bounded grids
    /// reject out-of-range targets, toroidal grids wrap them.
    fn resolve(&self, coord: Coordinate) -> Result<Coordinate, GridError> {
        match self.topology {
            Topology::Bounded => {
                if self.contains(coord) {
                    Ok(coord)
                } else {
                    Err(GridError::OutOfBounds(coord))
                }
            }
            Topology::Toroidal => Ok(Coordinate {
                x: coord.x % self.width,
                y: coord.y % self.height,
            }),
        }
    }

    /// State of the cell at `coord`. O(1).
    ///
    /// Panics if `coord` is outside the grid; cell lookups never wrap, on
    /// either topology.
    pub fn cell_state(&self, coord: Coordinate) -> CellState {
        self.cells[self.index(coord)]
    }

    /// Mark the cell at `coord` dirty. Used when laying out the initial dirt
    /// pattern; nothing re-dirties a cell once a run is underway.
    ///
    /// Panics if `coord` is outside the grid.
    pub fn mark_dirty(&mut self, coord: Coordinate) {
        let index = self.index(coord);
        self.cells[index] = CellState::Dirty;
    }

    /// Clear the dirty flag at `coord`. Idempotent: clearing an already-clean
    /// cell is a no-op.
    ///
    /// Panics if `coord` is outside the grid.
    pub fn set_cell_clean(&mut self, coord: Coordinate) {
        let index = self.index(coord);
        self.cells[index] = CellState::Clean;
    }

    /// The up-to-8 Moore neighbors of `coord`, in a fixed scan order so that
    /// seeded runs are reproducible. Never contains `coord` itself, never
    /// contains duplicates, and on a bounded grid never leaves the grid. A
    /// 1x1 grid has no neighbors on either topology.
    pub fn neighbors(&self, coord: Coordinate) -> Vec<Coordinate> {
        let mut result = Vec::with_capacity(8);
        for dy in [-1i64, 0, 1] {
            for dx in [-1i64, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = coord.x as i64 + dx;
                let ny = coord.y as i64 + dy;
                match self.topology {
                    Topology::Bounded => {
                        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                            continue;
                        }
                        result.push(Coordinate::new(nx as usize, ny as usize));
                    }
                    Topology::Toroidal => {
                        let wrapped = Coordinate::new(
                            nx.rem_euclid(self.width as i64) as usize,
                            ny.rem_euclid(self.height as i64) as usize,
                        );
                        // On narrow tori several offsets wrap onto the same
                        // cell, or back onto the center.
                        if wrapped != coord && !result.contains(&wrapped) {
                            result.push(wrapped);
                        }
                    }
                }
            }
        }
        result
    }

    /// Start tracking an agent at `coord`. Re-placing a known id overwrites
    /// its position.
    pub fn place_agent(&mut self, id: AgentId, coord: Coordinate) -> Result<(), GridError> {
        let coord = self.resolve(coord)?;
        self.agent_positions.insert(id, coord);
        Ok(())
    }

    /// Move a tracked agent to `coord`.
    pub fn move_agent(&mut self, id: AgentId, coord: Coordinate) -> Result<(), GridError> {
        let coord = self.resolve(coord)?;
        match self.agent_positions.get_mut(&id) {
            Some(position) => {
                *position = coord;
                Ok(())
            }
            None => Err(GridError::UnknownAgent(id)),
        }
    }

    /// Current position of an agent, if it has been placed.
    pub fn agent_position(&self, id: AgentId) -> Option<Coordinate> {
        self.agent_positions.get(&id).copied()
    }

    /// Ids of all agents currently occupying `coord`, in no guaranteed order.
    pub fn agents_at(&self, coord: Coordinate) -> Vec<AgentId> {
        self.agent_positions
            .iter()
            .filter(|(_, position)| **position == coord)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of agents tracked by the grid.
    pub fn agent_count(&self) -> usize {
        self.agent_positions.len()
    }

    /// Number of dirty cells. Linear scan.
    pub fn dirty_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&state| *state == CellState::Dirty)
            .count()
    }

    /// Number of clean cells. Linear scan.
    pub fn clean_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&state| *state == CellState::Clean)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_grid_starts_all_clean() {
        let grid = Grid::new(4, 3, Topology::Bounded);
        assert_eq!(grid.clean_count(), 12);
        assert_eq!(grid.dirty_count(), 0);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(grid.cell_state(Coordinate::new(x, y)), CellState::Clean);
            }
        }
    }

    #[test]
    fn test_mark_dirty_then_clean_round_trip() {
        let mut grid = Grid::new(4, 3, Topology::Bounded);
        let coord = Coordinate::new(2, 1);
        grid.mark_dirty(coord);
        assert_eq!(grid.cell_state(coord), CellState::Dirty);
        assert_eq!(grid.dirty_count(), 1);
        grid.set_cell_clean(coord);
        assert_eq!(grid.cell_state(coord), CellState::Clean);
        assert_eq!(grid.dirty_count(), 0);
    }

    #[test]
    fn test_set_cell_clean_is_idempotent() {
        let mut grid = Grid::new(2, 2, Topology::Bounded);
        let coord = Coordinate::new(0, 0);
        grid.set_cell_clean(coord);
        grid.set_cell_clean(coord);
        assert_eq!(grid.cell_state(coord), CellState::Clean);
        assert_eq!(grid.clean_count(), 4);
    }

    // x past the right edge of a 3x3 grid must not flatten onto (0, 1).
    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_mark_dirty_out_of_range_x_aborts_instead_of_aliasing() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        grid.mark_dirty(Coordinate::new(3, 0));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_cell_state_out_of_range_coordinate_aborts() {
        let grid = Grid::new(3, 3, Topology::Bounded);
        grid.cell_state(Coordinate::new(3, 0));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_cell_clean_out_of_range_coordinate_aborts() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        grid.set_cell_clean(Coordinate::new(0, 3));
    }

    #[test]
    fn test_bounded_neighbor_counts() {
        let grid = Grid::new(5, 5, Topology::Bounded);
        // corner, edge, interior
        assert_eq!(grid.neighbors(Coordinate::new(0, 0)).len(), 3);
        assert_eq!(grid.neighbors(Coordinate::new(2, 0)).len(), 5);
        assert_eq!(grid.neighbors(Coordinate::new(2, 2)).len(), 8);
    }

    #[test]
    fn test_bounded_neighbors_stay_in_bounds() {
        let grid = Grid::new(3, 3, Topology::Bounded);
        for y in 0..3 {
            for x in 0..3 {
                let coord = Coordinate::new(x, y);
                for neighbor in grid.neighbors(coord) {
                    assert!(grid.contains(neighbor));
                    assert_ne!(neighbor, coord);
                }
            }
        }
    }

    #[test]
    fn test_toroidal_corner_has_eight_neighbors() {
        let grid = Grid::new(5, 5, Topology::Toroidal);
        let neighbors = grid.neighbors(Coordinate::new(0, 0));
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.contains(&Coordinate::new(4, 4)));
        assert!(neighbors.contains(&Coordinate::new(4, 0)));
        assert!(neighbors.contains(&Coordinate::new(0, 4)));
    }

    #[test]
    fn test_narrow_torus_deduplicates_wrapped_neighbors() {
        let grid = Grid::new(2, 2, Topology::Toroidal);
        // All 8 offsets collapse onto the other 3 cells of a 2x2 torus.
        let neighbors = grid.neighbors(Coordinate::new(0, 0));
        assert_eq!(neighbors.len(), 3);
        assert!(!neighbors.contains(&Coordinate::new(0, 0)));
    }

    #[test]
    fn test_one_by_one_grid_has_no_neighbors() {
        let bounded = Grid::new(1, 1, Topology::Bounded);
        assert!(bounded.neighbors(Coordinate::new(0, 0)).is_empty());

        let torus = Grid::new(1, 1, Topology::Toroidal);
        assert!(torus.neighbors(Coordinate::new(0, 0)).is_empty());
    }

    #[test]
    fn test_move_agent_updates_position() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        grid.place_agent(0, Coordinate::new(1, 1)).expect("place failed");
        grid.move_agent(0, Coordinate::new(2, 2)).expect("move failed");
        assert_eq!(grid.agent_position(0), Some(Coordinate::new(2, 2)));
        assert_eq!(grid.agents_at(Coordinate::new(1, 1)), vec![]);
        assert_eq!(grid.agents_at(Coordinate::new(2, 2)), vec![0]);
    }

    #[test]
    fn test_move_agent_out_of_bounds_is_rejected() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        grid.place_agent(0, Coordinate::new(0, 0)).expect("place failed");
        assert_eq!(
            grid.move_agent(0, Coordinate::new(3, 0)),
            Err(GridError::OutOfBounds(Coordinate::new(3, 0)))
        );
        // position unchanged after the rejected move
        assert_eq!(grid.agent_position(0), Some(Coordinate::new(0, 0)));
    }

    #[test]
    fn test_move_agent_wraps_on_torus() {
        let mut grid = Grid::new(3, 3, Topology::Toroidal);
        grid.place_agent(0, Coordinate::new(2, 2)).expect("place failed");
        grid.move_agent(0, Coordinate::new(3, 3)).expect("move failed");
        assert_eq!(grid.agent_position(0), Some(Coordinate::new(0, 0)));
    }

    #[test]
    fn test_move_unknown_agent_is_rejected() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        assert_eq!(
            grid.move_agent(7, Coordinate::new(1, 1)),
            Err(GridError::UnknownAgent(7))
        );
    }

    #[test]
    fn test_multiple_agents_share_a_coordinate() {
        let mut grid = Grid::new(3, 3, Topology::Bounded);
        let coord = Coordinate::new(1, 1);
        grid.place_agent(0, coord).expect("place failed");
        grid.place_agent(1, coord).expect("place failed");
        grid.place_agent(2, coord).expect("place failed");
        let mut occupants = grid.agents_at(coord);
        occupants.sort_unstable();
        assert_eq!(occupants, vec![0, 1, 2]);
        assert_eq!(grid.agent_count(), 3);
    }

    proptest! {
        #[test]
        fn test_dirty_plus_clean_is_total(
            width in 1..12usize,
            height in 1..12usize,
            dirty in prop::collection::vec((0..12usize, 0..12usize), 0..20),
        ) {
            let mut grid = Grid::new(width, height, Topology::Bounded);
            for (x, y) in dirty {
                let coord = Coordinate::new(x % width, y % height);
                grid.mark_dirty(coord);
            }
            prop_assert_eq!(grid.dirty_count() + grid.clean_count(), width * height);
        }

        #[test]
        fn test_bounded_neighbors_valid_everywhere(
            width in 1..10usize,
            height in 1..10usize,
            x in 0..10usize,
            y in 0..10usize,
        ) {
            let grid = Grid::new(width, height, Topology::Bounded);
            let coord = Coordinate::new(x % width, y % height);
            let neighbors = grid.neighbors(coord);
            prop_assert!(neighbors.len() <= 8);
            for neighbor in &neighbors {
                prop_assert!(grid.contains(*neighbor));
                prop_assert_ne!(*neighbor, coord);
            }
        }

        #[test]
        fn test_toroidal_neighbors_unique_and_exclude_center(
            width in 1..10usize,
            height in 1..10usize,
            x in 0..10usize,
            y in 0..10usize,
        ) {
            let grid = Grid::new(width, height, Topology::Toroidal);
            let coord = Coordinate::new(x % width, y % height);
            let neighbors = grid.neighbors(coord);
            for (i, a) in neighbors.iter().enumerate() {
                prop_assert_ne!(*a, coord);
                for b in &neighbors[i + 1..] {
                    prop_assert_ne!(*a, *b);
                }
            }
        }
    }
}
