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

//! Command-line runner for the cleaning-robot simulation.
//!
//! Builds a simulation from flags, steps it to termination, and prints the
//! end-of-run statistics. Optionally traces clean/dirty counts per step and
//! renders the grid as text after each step.

use clap::Parser;
use cleaning_sim::{Simulation, SimulationConfig, StartPlacement};
use grid_world::{CellState, Coordinate, Topology};

#[derive(Debug, Parser)]
#[command(about = "Random-walk cleaning robots on a dirty grid")]
struct Args {
    /// Grid width.
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Grid height.
    #[arg(long, default_value_t = 10)]
    height: usize,

    /// Number of cleaning robots.
    #[arg(long, default_value_t = 5)]
    agents: usize,

    /// Maximum number of steps before the run is cut off.
    #[arg(long, default_value_t = 100)]
    budget: u64,

    /// Fraction of cells that start dirty, in (0, 1].
    #[arg(long, default_value_t = 0.5)]
    dirty: f64,

    /// Seed for the run. Omit for a fresh seed; the chosen seed is printed
    /// either way so any run can be replayed.
    #[arg(long)]
    seed: Option<u64>,

    /// Wrap the grid around both axes instead of stopping at the edges.
    #[arg(long)]
    torus: bool,

    /// x of the shared start cell.
    #[arg(long, default_value_t = 1)]
    start_x: usize,

    /// y of the shared start cell.
    #[arg(long, default_value_t = 1)]
    start_y: usize,

    /// Scatter robots over random cells instead of the shared start cell.
    #[arg(long)]
    random_start: bool,

    /// Print clean/dirty counts after every step.
    #[arg(long)]
    trace: bool,

    /// Render the grid as text after every step.
    #[arg(long)]
    render: bool,

    /// Print the final summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            width: self.width,
            height: self.height,
            num_agents: self.agents,
            step_budget: self.budget,
            dirty_percentage: self.dirty,
            random_seed: self.seed,
            topology: if self.torus {
                Topology::Toroidal
            } else {
                Topology::Bounded
            },
            start: if self.random_start {
                StartPlacement::RandomPerAgent
            } else {
                StartPlacement::Fixed(Coordinate::new(self.start_x, self.start_y))
            },
        }
    }
}

/// One text row per grid row: `#` dirty, `.` clean, a digit for the number of
/// robots on the cell (`*` for ten or more).
fn render_grid(simulation: &Simulation) -> String {
    let grid = simulation.grid();
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let coord = Coordinate::new(x, y);
            let occupants = grid.agents_at(coord).len();
            let c = if occupants >= 10 {
                '*'
            } else if occupants > 0 {
                char::from_digit(occupants as u32, 10).unwrap()
            } else if grid.cell_state(coord) == CellState::Dirty {
                '#'
            } else {
                '.'
            };
            out.push(c);
        }
        if y < grid.height() - 1 {
            out.push('\n');
        }
    }
    out
}

fn main() {
    let args = Args::parse();

    let mut simulation = match Simulation::new(args.to_config()) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    println!("seed: {}", simulation.seed());

    while simulation.is_running() {
        simulation.step();
        if args.trace {
            println!(
                "step {}: clean {} dirty {}",
                simulation.elapsed_steps(),
                simulation.clean_count(),
                simulation.dirty_count()
            );
        }
        if args.render {
            println!("{}", render_grid(&simulation));
            println!();
        }
    }

    let summary = simulation.summary();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).expect("summary serializes")
        );
    } else {
        println!("initial dirty cells: {}", summary.initial_dirty);
        println!("final dirty cells: {}", summary.final_dirty);
        println!("elapsed steps: {}", summary.elapsed_steps);
        println!("total moves: {}", summary.total_moves);
        println!(
            "percentage of dirty cells: {:.2}%",
            summary.final_dirty_percentage
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_args() -> Args {
        Args {
            width: 3,
            height: 2,
            agents: 2,
            budget: 10,
            dirty: 1.0,
            seed: Some(42),
            torus: false,
            start_x: 0,
            start_y: 0,
            random_start: false,
            trace: false,
            render: false,
            json: false,
        }
    }

    #[test]
    fn test_render_dimensions_and_alphabet() {
        let simulation = Simulation::new(small_args().to_config()).expect("construction failed");
        let rendered = render_grid(&simulation);
        let rows: Vec<&str> = rendered.split('\n').collect();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.chars().count(), 3);
        }
        // both robots share the start cell of an all-dirty grid
        assert!(rendered.starts_with('2'));
        assert_eq!(rendered.matches('#').count(), 5);
    }

    #[test]
    fn test_args_map_onto_config() {
        let mut args = small_args();
        args.torus = true;
        args.random_start = true;
        let config = args.to_config();
        assert_eq!(config.topology, Topology::Toroidal);
        assert_eq!(config.start, StartPlacement::RandomPerAgent);
        assert_eq!(config.step_budget, 10);
    }
}
