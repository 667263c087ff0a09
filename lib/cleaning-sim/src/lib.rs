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

//! Cleaning-robot simulation over a dirty grid.
//!
//! Robots share a rectangular grid of clean/dirty cells. Each step every
//! robot is activated once, in a freshly shuffled random order: a robot on a
//! dirty cell cleans it, otherwise it wanders to a random Moore neighbor.
//! The run ends when the step budget is exhausted or every cell is clean.
//!
//! All randomness (initial dirt layout, activation order, wandering) comes
//! from one generator seeded per run, so a run is fully reproducible from
//! its configuration and seed.

use grid_world::Coordinate;
use serde::{Deserialize, Serialize};

pub mod simulation;

pub use simulation::{Simulation, Status, StepRecord, Summary};

/// The pseudo-random generator threaded through the whole simulation.
pub type Rng = rand_pcg::Pcg64;

/// What a robot does with its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Clear the dirty flag of the occupied cell.
    Clean,

    /// Move to a uniformly chosen Moore neighbor.
    MoveRandom,
}

/// The reflex rule: clean a dirty cell, otherwise wander.
///
/// Pure and stateless; where `MoveRandom` actually lands is decided later
/// with the simulation's generator, and on a grid with no neighbors it
/// commits as a no-op.
pub fn decide(cell_is_dirty: bool) -> Action {
    if cell_is_dirty {
        Action::Clean
    } else {
        Action::MoveRandom
    }
}

/// Configuration error. Fatal: the simulation cannot be constructed and there
/// is no retry, callers must fix the parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Grid width must be positive.
    #[error("width must be positive")]
    ZeroWidth,

    /// Grid height must be positive.
    #[error("height must be positive")]
    ZeroHeight,

    /// At least one robot is required.
    #[error("at least one agent is required")]
    NoAgents,

    /// Dirty percentage outside the half-open interval (0, 1].
    #[error("dirty percentage must be in (0, 1]: {0}")]
    DirtyPercentageOutOfRange(f64),

    /// A fixed start coordinate must be inside the grid.
    #[error("start coordinate is out of bounds: {0}")]
    StartOutOfBounds(Coordinate),
}

/// Where robots begin the run.
///
/// The reference behavior co-locates every robot at one fixed cell; random
/// per-agent placement is the alternative policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartPlacement {
    /// All robots start on this cell.
    Fixed(Coordinate),

    /// Each robot starts on an independently chosen random cell.
    RandomPerAgent,
}

/// Simulation parameters, validated once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid width, > 0.
    pub width: usize,

    /// Grid height, > 0.
    pub height: usize,

    /// Number of robots, > 0.
    pub num_agents: usize,

    /// Maximum number of steps before the run is cut off.
    pub step_budget: u64,

    /// Fraction of cells that start dirty, in (0, 1]. The dirty-cell target
    /// is `floor(width * height * dirty_percentage)`.
    pub dirty_percentage: f64,

    /// Seed for the run's generator. `None` draws a fresh seed from system
    /// entropy; the drawn seed is recorded on the simulation so the run can
    /// still be replayed.
    pub random_seed: Option<u64>,

    /// Edge behavior of the grid.
    pub topology: grid_world::Topology,

    /// Start placement policy for the robots.
    pub start: StartPlacement,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            num_agents: 5,
            step_budget: 100,
            dirty_percentage: 0.5,
            random_seed: None,
            topology: grid_world::Topology::Bounded,
            start: StartPlacement::Fixed(Coordinate::new(1, 1)),
        }
    }
}

impl SimulationConfig {
    /// Check all parameters, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if self.num_agents == 0 {
            return Err(ConfigError::NoAgents);
        }
        // The negated comparison also rejects NaN.
        if !(self.dirty_percentage > 0.0 && self.dirty_percentage <= 1.0) {
            return Err(ConfigError::DirtyPercentageOutOfRange(
                self.dirty_percentage,
            ));
        }
        if let StartPlacement::Fixed(coord) = self.start {
            if coord.x >= self.width || coord.y >= self.height {
                return Err(ConfigError::StartOutOfBounds(coord));
            }
        }
        Ok(())
    }

    /// The number of cells that start dirty for these parameters.
    pub fn dirty_cell_target(&self) -> usize {
        ((self.width * self.height) as f64 * self.dirty_percentage).floor() as usize
    }
}
