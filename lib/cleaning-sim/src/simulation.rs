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

//! The simulation controller: owns the grid, the activation schedule, the
//! budget and the run statistics, and advances the world one step at a time.

use grid_world::{AgentId, CellState, Coordinate, Grid};
use rand::seq::SliceRandom;
use rand::{Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{decide, Action, ConfigError, Rng, SimulationConfig, StartPlacement};

type HashSet<T> = rustc_hash::FxHashSet<T>;

/// Random-activation schedule: every registered agent runs exactly once per
/// step, in a fresh uniform permutation each step.
///
/// Activation within a step is strictly sequential. An agent activated later
/// in a sweep sees the grid mutations of agents activated earlier in the same
/// sweep; there is no batching.
#[derive(Debug, Clone)]
pub struct RandomActivation {
    agents: Vec<AgentId>,
}

impl RandomActivation {
    /// Register agents `0..num_agents`.
    pub fn new(num_agents: usize) -> Self {
        Self {
            agents: (0..num_agents).collect(),
        }
    }

    /// The registered agent ids in registration order.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Produce this step's activation order. Not a rotation: every step is an
    /// independent uniform shuffle.
    pub fn shuffled(&self, rng: &mut Rng) -> Vec<AgentId> {
        let mut order = self.agents.clone();
        order.shuffle(rng);
        order
    }
}

/// Lifecycle of the controller. Construction transitions straight into
/// `Running`; `Terminated` is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The run still accepts steps.
    Running,

    /// Budget exhausted or every cell clean; further steps are no-ops.
    Terminated,
}

/// Clean/dirty counts observed after a step, for live charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Elapsed steps when the observation was taken; 0 is the initial state.
    pub step: u64,

    /// Clean cells at that point.
    pub clean: usize,

    /// Dirty cells at that point.
    pub dirty: usize,
}

/// End-of-run statistics.
///
/// The `final_*` fields are only meaningful once the run has terminated;
/// while it is still running they report the current grid state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Dirty cells at construction.
    pub initial_dirty: usize,

    /// Dirty cells remaining.
    pub final_dirty: usize,

    /// Steps actually executed.
    pub elapsed_steps: u64,

    /// Committed random moves across the whole run. Cleaning an occupied
    /// cell does not count as a move.
    pub total_moves: u64,

    /// `final_dirty * 100 / (width * height)`.
    pub final_dirty_percentage: f64,
}

/// The simulation: grid, schedule, seeded generator, budget and counters.
pub struct Simulation {
    grid: Grid,
    schedule: RandomActivation,
    rng: Rng,
    seed: u64,
    status: Status,
    initial_dirty: usize,
    final_dirty: usize,
    elapsed_steps: u64,
    remaining_budget: u64,
    total_moves: u64,
    history: Vec<StepRecord>,
}

impl Simulation {
    /// Validate the configuration and build the initial world: mark the
    /// dirty cells, place the robots, and start running.
    ///
    /// The dirty layout samples `floor(width * height * dirty_percentage)`
    /// distinct coordinates without replacement from the run's generator.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let mut rng = Rng::seed_from_u64(seed);
        let mut grid = Grid::new(config.width, config.height, config.topology);

        let target = config.dirty_cell_target();
        let mut dirty = HashSet::default();
        while dirty.len() < target {
            let coord = Coordinate::new(
                rng.gen_range(0..config.width),
                rng.gen_range(0..config.height),
            );
            if dirty.insert(coord) {
                grid.mark_dirty(coord);
            }
        }

        for id in 0..config.num_agents {
            let start = match config.start {
                StartPlacement::Fixed(coord) => coord,
                StartPlacement::RandomPerAgent => Coordinate::new(
                    rng.gen_range(0..config.width),
                    rng.gen_range(0..config.height),
                ),
            };
            grid.place_agent(id, start)
                .expect("validated start coordinate is in bounds");
        }

        let initial_dirty = grid.dirty_count();
        let history = vec![StepRecord {
            step: 0,
            clean: grid.clean_count(),
            dirty: initial_dirty,
        }];

        Ok(Self {
            grid,
            schedule: RandomActivation::new(config.num_agents),
            rng,
            seed,
            status: Status::Running,
            initial_dirty,
            final_dirty: initial_dirty,
            elapsed_steps: 0,
            remaining_budget: config.step_budget,
            total_moves: 0,
            history,
        })
    }

    fn is_terminal_condition(&self) -> bool {
        self.remaining_budget == 0 || self.grid.dirty_count() == 0
    }

    fn finalize(&mut self) {
        self.final_dirty = self.grid.dirty_count();
        self.status = Status::Terminated;
    }

    /// Advance the world by one step. A no-op once terminated.
    ///
    /// If the budget is already spent or nothing is dirty, the run finalizes
    /// without activating anyone. Otherwise every robot is activated once in
    /// this step's shuffled order, the budget is decremented, and the run
    /// finalizes immediately if that sweep spent the budget or cleaned the
    /// last cell.
    pub fn step(&mut self) {
        if self.status == Status::Terminated {
            return;
        }
        if self.is_terminal_condition() {
            self.finalize();
            return;
        }

        let mut moves = 0u64;
        for id in self.schedule.shuffled(&mut self.rng) {
            let position = self
                .grid
                .agent_position(id)
                .expect("scheduled agent is tracked by the grid");
            match decide(self.grid.cell_state(position) == CellState::Dirty) {
                Action::Clean => self.grid.set_cell_clean(position),
                Action::MoveRandom => {
                    let neighbors = self.grid.neighbors(position);
                    // A 1x1 grid has no neighbors; wandering is a no-op then,
                    // not an error, and not a move.
                    if let Some(target) = neighbors.choose(&mut self.rng) {
                        self.grid
                            .move_agent(id, *target)
                            .expect("moore neighbor is a valid grid coordinate");
                        moves += 1;
                    }
                }
            }
        }

        self.remaining_budget -= 1;
        self.elapsed_steps += 1;
        self.total_moves += moves;
        self.history.push(StepRecord {
            step: self.elapsed_steps,
            clean: self.grid.clean_count(),
            dirty: self.grid.dirty_count(),
        });

        if self.is_terminal_condition() {
            self.finalize();
        }
    }

    /// Step until the run terminates. Bounded by the remaining budget.
    pub fn run_to_completion(&mut self) {
        while self.status == Status::Running {
            self.step();
        }
    }

    /// Whether the run still accepts steps.
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Current lifecycle state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The grid, for rendering.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// State of one cell, for per-cell rendering.
    pub fn cell_state(&self, coord: Coordinate) -> CellState {
        self.grid.cell_state(coord)
    }

    /// Robots occupying one cell, for per-cell rendering.
    pub fn agents_at(&self, coord: Coordinate) -> Vec<AgentId> {
        self.grid.agents_at(coord)
    }

    /// Dirty cells right now.
    pub fn dirty_count(&self) -> usize {
        self.grid.dirty_count()
    }

    /// Clean cells right now.
    pub fn clean_count(&self) -> usize {
        self.grid.clean_count()
    }

    /// Steps executed so far.
    pub fn elapsed_steps(&self) -> u64 {
        self.elapsed_steps
    }

    /// Steps left in the budget.
    pub fn remaining_budget(&self) -> u64 {
        self.remaining_budget
    }

    /// Committed random moves so far.
    pub fn total_moves(&self) -> u64 {
        self.total_moves
    }

    /// The seed this run's generator was created with. For an unseeded
    /// configuration this is the drawn seed, so the run can be replayed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Clean/dirty counts per step, starting with the initial state at step
    /// 0. Kept for the session only.
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    /// The run's statistics so far; see [`Summary`].
    pub fn summary(&self) -> Summary {
        let final_dirty = match self.status {
            Status::Terminated => self.final_dirty,
            Status::Running => self.grid.dirty_count(),
        };
        let total_cells = (self.grid.width() * self.grid.height()) as f64;
        Summary {
            initial_dirty: self.initial_dirty,
            final_dirty,
            elapsed_steps: self.elapsed_steps,
            total_moves: self.total_moves,
            final_dirty_percentage: final_dirty as f64 * 100.0 / total_cells,
        }
    }
}
