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

//! Tunable constants for the simulator, collected with their spec-reference
//! defaults, following the small-config-struct-with-a-`Default`-impl
//! pattern used for the timing model's [`ModelParams`]-style configuration
//! in the teacher library.

/// Centralized tunables for a [`Simulation`](crate::simulation::Simulation) run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Radio neighbor radius `R`. Two nodes are neighbors iff their
    /// Euclidean distance is `<= radio_radius`.
    pub radio_radius: f64,
    /// Maximum single-cell displacement radius used by [`Grid::mutate`](crate::grid::Grid::mutate).
    pub mobility_radius: f64,
    /// Hard capacity of every node's [`PacketQueue`](crate::queue::PacketQueue).
    pub queue_capacity: usize,
    /// AODV: timeslots since the last re-discovery before the source emits
    /// a fresh `RouteRequest`.
    pub aodv_timeout: u64,
    /// AODV / Custom: a packet is retried in place once its retransmit
    /// count exceeds this limit (gating is `<= retry_limit`).
    pub retry_limit: u32,
    /// OLSR: timeslots between flooded `LinkState` beacons (and the
    /// routing-table staleness window).
    pub olsr_link_update_period: u64,
    /// Custom: maximum number of stable-sorted neighbors a forwarding node
    /// offers a `RouteRequest`/broadcast `RouteReply` to per step.
    pub custom_degree: usize,
    /// Timeslots between grid mutations.
    pub mutate_every: u64,
    /// Timeslots between OLSR MPR recomputations.
    pub mpr_recompute_every: u64,
    /// Simulation ceiling: the loop stops once `timeslot >= max_timeslots`
    /// even if an engine has not finished.
    pub max_timeslots: u64,
    /// Range `(low, high)` the per-node Bernoulli transmission probability
    /// is drawn from, see [`scheduler`](crate::scheduler).
    pub tx_probability: (f64, f64),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            radio_radius: 5.0,
            mobility_radius: 5.0,
            queue_capacity: 10,
            aodv_timeout: 100,
            retry_limit: 3,
            olsr_link_update_period: 50,
            custom_degree: 1,
            mutate_every: 10,
            mpr_recompute_every: 100,
            max_timeslots: 5000,
            tx_probability: (0.1, 0.5),
        }
    }
}
