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

//! Per-timeslot transmission scheduler.
//!
//! Each node independently draws a Bernoulli trial with its own success
//! probability; the set of nodes whose draw succeeds is this slot's
//! transmitter set. Mirrors the per-entity stateless-draw shape of
//! [`SimpleTimingModel::push`](crate) in the teacher library, which samples
//! a fresh delay from a per-router-pair distribution on every call.

use rand::distributions::Bernoulli;
use rand::{Rng, RngCore};

use crate::config::SimConfig;
use crate::node::NodeId;

/// Probability that `node` successfully transmits this slot, given `config`
/// and the total node count. Depends only on the node's id and the
/// configured range, so it is reproducible without consulting mutable grid
/// state (future policies may read grid state, but the scheduler contract
/// only ever needs a deterministic function of readable inputs).
pub fn transmission_probability(node: NodeId, num_nodes: usize, config: &SimConfig) -> f64 {
    if num_nodes == 0 {
        return config.tx_probability.0;
    }
    let (low, high) = config.tx_probability;
    low + (high - low) * (node as f64 / num_nodes as f64)
}

/// Draw the set of nodes that transmit this timeslot.
pub fn transmitters<R: RngCore>(
    node_ids: &[NodeId],
    config: &SimConfig,
    rng: &mut R,
) -> Vec<NodeId> {
    node_ids
        .iter()
        .copied()
        .filter(|&node| {
            let p = transmission_probability(node, node_ids.len(), config);
            let dist = Bernoulli::new(p).expect("probability must be in [0, 1]");
            rng.sample(dist)
        })
        .collect()
}
