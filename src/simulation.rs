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

//! The simulation driver: wires a [`Grid`] together with the three
//! protocol engines and runs the discrete-time loop to completion.
//!
//! Mirrors the teacher library's top-level simulation runner: a single
//! synchronous loop that advances one timeslot at a time, handing every
//! engine an identical read-only snapshot of the current neighbor map and
//! this slot's transmitter set, mutating the grid only between slots.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::grid::Grid;
use crate::node::{Node, NodeId};
use crate::protocol::custom::Custom;
use crate::protocol::olsr::Olsr;
use crate::protocol::{aodv::Aodv, Engine, EngineResult};
use crate::scheduler;

/// Which of the three routing protocols a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    /// Reactive, on-demand route discovery.
    Aodv,
    /// Proactive, MPR-restricted link-state flooding.
    Olsr,
    /// Mobility-aware reactive variant.
    Custom,
}

fn trivial_result() -> EngineResult {
    EngineResult {
        timeslots: 0,
        overhead: 0,
        queue_usage_percent: 0.0,
        finished: true,
    }
}

/// A completed simulation run: the chosen source/target pair and each
/// protocol's final reported metrics.
#[derive(Debug, Clone)]
pub struct Simulation {
    source: NodeId,
    target: NodeId,
    results: HashMap<ProtocolKind, EngineResult>,
}

impl Simulation {
    /// Build and run a simulation to completion.
    ///
    /// A source and target are drawn uniformly at random (reseeding the
    /// draw until they differ) from `grid`'s placed nodes, then AODV, OLSR,
    /// and Custom engines race to establish a route between them. The loop
    /// runs synchronously here, advancing one timeslot per iteration, until
    /// every engine has finished or `config.max_timeslots` is reached.
    ///
    /// A grid with fewer than two nodes has no distinct source/target pair
    /// to route between: every engine is reported as finished at slot 0
    /// with zero overhead instead of running at all.
    pub fn new(grid: Grid, config: SimConfig) -> Result<Self, SimError> {
        Self::with_seed(grid, config, None)
    }

    /// Like [`Simulation::new`], but seeds the simulation's own RNG (used
    /// for source/target selection, the per-slot transmission schedule, and
    /// OLSR's MPR tie-breaking) explicitly, for reproducible runs.
    pub fn with_seed(mut grid: Grid, config: SimConfig, seed: Option<u64>) -> Result<Self, SimError> {
        let node_ids: Vec<NodeId> = grid.devices().iter().map(Node::id).collect();

        if node_ids.len() < 2 {
            let source = node_ids.first().copied().unwrap_or(0);
            let mut results = HashMap::new();
            results.insert(ProtocolKind::Aodv, trivial_result());
            results.insert(ProtocolKind::Olsr, trivial_result());
            results.insert(ProtocolKind::Custom, trivial_result());
            return Ok(Self {
                source,
                target: source,
                results,
            });
        }

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let (source, target) = loop {
            let s = node_ids[rng.gen_range(0..node_ids.len())];
            let t = node_ids[rng.gen_range(0..node_ids.len())];
            if s != t {
                break (s, t);
            }
        };

        let mut aodv = Aodv::new(source, target, &node_ids, &config);
        let mut olsr = Olsr::new(source, target, &node_ids, &config);
        let mut custom = Custom::new(source, target, &node_ids, &config);
        olsr.choose_mpr(grid.neighbors(), &mut rng);

        let mut time_slot: u64 = 0;
        loop {
            let running = !aodv.is_finished() || !olsr.is_finished() || !custom.is_finished();
            if !running || time_slot >= config.max_timeslots {
                break;
            }

            let transmitters = scheduler::transmitters(&node_ids, &config, &mut rng);
            let neighbors = grid.neighbors().clone();
            aodv.step(time_slot, &neighbors, &transmitters);
            olsr.step(time_slot, &neighbors, &transmitters);
            custom.step(time_slot, &neighbors, &transmitters);

            if time_slot > 0 && time_slot.is_multiple_of(config.mutate_every) {
                let deltas = grid.mutate();
                let delta_map: HashMap<NodeId, u64> = node_ids
                    .iter()
                    .enumerate()
                    .map(|(i, &id)| (id, deltas[i] as u64))
                    .collect();
                custom.record_movement(&delta_map);
            }
            if time_slot > 0 && time_slot.is_multiple_of(config.mpr_recompute_every) {
                olsr.choose_mpr(grid.neighbors(), &mut rng);
            }

            time_slot += 1;
        }

        let mut results = HashMap::new();
        results.insert(ProtocolKind::Aodv, aodv.result());
        results.insert(ProtocolKind::Olsr, olsr.result());
        results.insert(ProtocolKind::Custom, custom.result());

        Ok(Self {
            source,
            target,
            results,
        })
    }

    /// The node that route discovery started from.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The node route discovery was aimed at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Final per-protocol results.
    pub fn end(&self) -> HashMap<ProtocolKind, EngineResult> {
        self.results.clone()
    }
}
