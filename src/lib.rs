// SwarmNet: MANET routing protocol simulator written in Rust
// Copyright (C) 2024 SwarmNet Contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

#![deny(missing_docs, missing_debug_implementations)]

//! # SwarmNet
//!
//! A discrete-time simulator that compares reactive and proactive routing
//! protocols on a mobile ad-hoc wireless network (MANET) of radio nodes
//! placed on a 2D integer grid.
//!
//! The [`Grid`](grid::Grid) places a sparse swarm of nodes and tracks their
//! radio-neighbor relation as nodes drift ("mutate") across timeslots. The
//! [`Simulation`](simulation::Simulation) drives three independent routing
//! protocol engines: AODV (reactive), OLSR (proactive, MPR flooding), and
//! a mobility-aware Custom variant, over bounded per-node packet queues,
//! and reports how long each protocol takes to establish a route from a
//! random source to a random target, how much control overhead it
//! generated, and the average queue occupancy it sustained.
//!
//! ```
//! use swarmnet::config::SimConfig;
//! use swarmnet::grid::Grid;
//! use swarmnet::simulation::Simulation;
//!
//! let grid = Grid::new(20, Some(1)).unwrap();
//! let sim = Simulation::new(grid, SimConfig::default()).unwrap();
//! for (protocol, result) in sim.end() {
//!     println!("{protocol:?}: {result:?}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod node;
pub mod packet;
pub mod protocol;
pub mod queue;
pub mod scheduler;
pub mod simulation;

pub use config::SimConfig;
pub use error::SimError;
pub use grid::Grid;
pub use simulation::Simulation;
