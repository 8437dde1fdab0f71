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

//! OLSR: proactive link-state flooding restricted to multi-point relays.
//!
//! Every node periodically floods a `LinkState` beacon about itself; a node
//! only forwards floods (both beacons and the initial `RouteRequest`) to
//! neighbors in its current MPR (multi-point relay) set, a greedily chosen
//! subset that covers all of the node's two-hop neighborhood. A route is
//! considered found the moment any forwarding transmitter sees a
//! sufficiently fresh entry for the target in a relay's routing table.

use std::collections::{HashMap, HashSet};

use log::debug;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::config::SimConfig;
use crate::node::NodeId;
use crate::packet::Packet;
use crate::protocol::{Engine, EngineResult, Metrics};
use crate::queue::QueueHolder;

/// Proactive OLSR engine.
#[derive(Debug, Clone)]
pub struct Olsr {
    source: NodeId,
    target: NodeId,
    timeout: u64,
    link_update_period: u64,
    queue_capacity: usize,
    queues: QueueHolder,
    mpr: HashMap<NodeId, Vec<NodeId>>,
    /// `routing_tables[node][dst]` = timestamp of the most recent
    /// `LinkState` from `dst` heard by `node`, `-1` if never heard.
    routing_tables: HashMap<NodeId, HashMap<NodeId, i64>>,
    /// Last RREQ timestamp forwarded to (and accepted by) each node.
    received: HashMap<NodeId, u64>,
    last_timeout: u64,
    last_link_update: Option<u64>,
    metrics: Metrics,
}

impl Olsr {
    /// Build a new OLSR engine. `chose_mpr` must be called once
    /// (`Olsr::choose_mpr`) after construction before the first `step`.
    pub fn new(source: NodeId, target: NodeId, node_ids: &[NodeId], config: &SimConfig) -> Self {
        let queues = QueueHolder::new(node_ids.iter().copied(), config.queue_capacity);
        let routing_tables = node_ids
            .iter()
            .map(|&n| {
                let table = node_ids.iter().map(|&d| (d, -1i64)).collect();
                (n, table)
            })
            .collect();
        Self {
            source,
            target,
            timeout: config.aodv_timeout,
            link_update_period: config.olsr_link_update_period,
            queue_capacity: config.queue_capacity,
            queues,
            mpr: HashMap::new(),
            routing_tables,
            received: HashMap::new(),
            last_timeout: 0,
            last_link_update: None,
            metrics: Metrics::default(),
        }
    }

    /// Recompute every node's MPR set by greedy two-hop set cover,
    /// iterating each node's neighbors in a seeded-shuffled order and
    /// breaking ties randomly. Clears any previously chosen MPR set first
    /// (the teacher prototype's `chooseMPR` appends across calls without
    /// clearing, which is flagged as a bug in the spec's Open Questions;
    /// this implementation clears on every recompute).
    pub fn choose_mpr<R: RngCore>(
        &mut self,
        neighbors: &HashMap<NodeId, Vec<NodeId>>,
        rng: &mut R,
    ) {
        self.mpr.clear();
        let mut node_ids: Vec<NodeId> = neighbors.keys().copied().collect();
        node_ids.sort_unstable();
        for n in node_ids {
            let n_neighbors = &neighbors[&n];
            let neighbor_set: HashSet<NodeId> = n_neighbors.iter().copied().collect();
            let mut two_hop: HashSet<NodeId> = HashSet::new();
            for &k in n_neighbors {
                if let Some(k_neighbors) = neighbors.get(&k) {
                    for &m in k_neighbors {
                        if m != n && !neighbor_set.contains(&m) {
                            two_hop.insert(m);
                        }
                    }
                }
            }

            let mut order = n_neighbors.clone();
            order.shuffle(rng);

            let mut chosen = Vec::new();
            for k in order {
                if two_hop.is_empty() {
                    break;
                }
                let Some(k_neighbors) = neighbors.get(&k) else {
                    continue;
                };
                let covers: Vec<NodeId> = k_neighbors
                    .iter()
                    .copied()
                    .filter(|m| two_hop.contains(m))
                    .collect();
                if !covers.is_empty() {
                    chosen.push(k);
                    for m in covers {
                        two_hop.remove(&m);
                    }
                }
            }
            self.mpr.insert(n, chosen);
        }
    }

    /// Current multi-point relay set chosen for each node.
    pub fn mpr(&self) -> &HashMap<NodeId, Vec<NodeId>> {
        &self.mpr
    }

    /// `routing_tables[node][dst]`: the timestamp of the most recent
    /// `LinkState` from `dst` heard by `node`, `-1` if never heard.
    pub fn routing_tables(&self) -> &HashMap<NodeId, HashMap<NodeId, i64>> {
        &self.routing_tables
    }

    fn begin_discover(&mut self, time_slot: u64) {
        if let Some(q) = self.queues.get_mut(self.source) {
            q.push_back(Packet::route_request(time_slot, self.source, self.target));
        }
    }

    fn flood_link_state(&mut self, node_ids: &mut [NodeId], time_slot: u64) {
        node_ids.sort_unstable();
        for &n in node_ids.iter() {
            if let Some(q) = self.queues.get_mut(n) {
                q.push_back(Packet::link_state(time_slot, n));
            }
        }
    }

    fn table_has_valid_route(&self, node: NodeId, dst: NodeId, time_slot: u64) -> bool {
        self.routing_tables
            .get(&node)
            .and_then(|t| t.get(&dst))
            .map(|&ts| ts >= 0 && (time_slot as i64 - ts) <= self.link_update_period as i64)
            .unwrap_or(false)
    }

    fn process(&mut self, node: NodeId, mpr_neighbors: &[NodeId], time_slot: u64) {
        let Some(mut packet) = self.queues.get_mut(node).and_then(|q| q.pop_front()) else {
            return;
        };
        let mut sent = false;
        let mut overhead = 0u64;

        match &packet {
            Packet::RouteRequest { .. } => {
                for &m in mpr_neighbors {
                    if m == self.target || self.table_has_valid_route(m, self.target, time_slot) {
                        self.metrics.record_overhead(overhead);
                        self.metrics.finish(time_slot);
                        debug!("olsr: route to target found via relay {m} at slot {time_slot}");
                        return;
                    }
                    let last = self.received.get(&m).copied();
                    let ts = packet.header().timestamp;
                    if last.map(|l| l < ts).unwrap_or(true) {
                        let copy = packet.forwarded_with(m);
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_back(copy);
                        }
                        self.received.insert(m, ts);
                    }
                    overhead += 1;
                    sent = true;
                }
            }
            Packet::LinkState { header, .. } => {
                let src = header.source;
                let ts = header.timestamp;
                for &m in mpr_neighbors {
                    let table = self.routing_tables.entry(m).or_default();
                    let known = table.get(&src).copied().unwrap_or(-1);
                    if known < ts as i64 {
                        table.insert(src, ts as i64);
                        let copy = packet.forwarded_with(m);
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_back(copy);
                        }
                        overhead += 1;
                        sent = true;
                    }
                }
            }
            Packet::RouteReply { .. } => unreachable!("OLSR never carries RouteReply packets"),
        }

        self.metrics.record_overhead(overhead);

        if !sent {
            packet.retransmit();
            if let Some(q) = self.queues.get_mut(node) {
                q.push_front(packet);
            }
        }
    }
}

impl Engine for Olsr {
    fn step(
        &mut self,
        time_slot: u64,
        neighbors: &HashMap<NodeId, Vec<NodeId>>,
        transmitters: &[NodeId],
    ) {
        if self.is_finished() {
            return;
        }
        if time_slot == 0 {
            self.begin_discover(time_slot);
        }
        if time_slot.saturating_sub(self.last_timeout) > self.timeout {
            self.begin_discover(time_slot);
            self.last_timeout = time_slot;
        }
        let due_link_update = match self.last_link_update {
            None => true,
            Some(last) => time_slot.saturating_sub(last) >= self.link_update_period,
        };
        if due_link_update {
            let mut node_ids: Vec<NodeId> = neighbors.keys().copied().collect();
            self.flood_link_state(&mut node_ids, time_slot);
            self.last_link_update = Some(time_slot);
        }

        for &node in transmitters {
            if self.is_finished() {
                break;
            }
            let has_packet = self
                .queues
                .get(node)
                .map(|q| !q.is_empty())
                .unwrap_or(false);
            if !has_packet {
                continue;
            }
            let empty = Vec::new();
            let all_neighbors = neighbors.get(&node).unwrap_or(&empty);
            let mpr_set = self.mpr.get(&node).cloned().unwrap_or_default();
            let active_relays: Vec<NodeId> = mpr_set
                .into_iter()
                .filter(|m| all_neighbors.contains(m))
                .collect();
            self.process(node, &active_relays, time_slot);
        }
        let mean = self.queues.mean_occupancy();
        self.metrics.sample_occupancy(time_slot, mean);
    }

    fn is_finished(&self) -> bool {
        self.metrics.is_finished()
    }

    fn result(&self) -> EngineResult {
        self.metrics.result(self.queue_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A 5-node chain 0-1-2-3-4, where every forwarding node has a
    /// non-trivial two-hop neighborhood (unlike a 3-node line, where the
    /// middle node's MPR set is vacuously empty).
    fn chain_topology() -> HashMap<NodeId, Vec<NodeId>> {
        HashMap::from([
            (0, vec![1]),
            (1, vec![0, 2]),
            (2, vec![1, 3]),
            (3, vec![2, 4]),
            (4, vec![3]),
        ])
    }

    #[test]
    fn mpr_selection_covers_every_two_hop_neighbor() {
        let neighbors = chain_topology();
        let node_ids = [0, 1, 2, 3, 4];
        let config = SimConfig::default();
        let mut olsr = Olsr::new(0, 4, &node_ids, &config);
        let mut rng = StdRng::seed_from_u64(1);
        olsr.choose_mpr(&neighbors, &mut rng);

        // Every relay chosen for a node must be one of its neighbors, and
        // together they must cover every two-hop neighbor of that node.
        for (&n, relays) in olsr.mpr() {
            let n_neighbors: HashSet<NodeId> = neighbors[&n].iter().copied().collect();
            for r in relays {
                assert!(n_neighbors.contains(r));
            }
            let mut two_hop = HashSet::new();
            for &k in &neighbors[&n] {
                for &m in &neighbors[&k] {
                    if m != n && !n_neighbors.contains(&m) {
                        two_hop.insert(m);
                    }
                }
            }
            let covered: HashSet<NodeId> = relays
                .iter()
                .flat_map(|r| neighbors[r].iter().copied())
                .collect();
            assert!(
                two_hop.is_subset(&covered),
                "node {n}'s MPR set {relays:?} does not cover two-hop neighbors {two_hop:?}"
            );
        }
    }

    #[test]
    fn recomputing_mpr_does_not_grow_the_set_unboundedly() {
        let neighbors = chain_topology();
        let node_ids = [0, 1, 2, 3, 4];
        let config = SimConfig::default();
        let mut olsr = Olsr::new(0, 4, &node_ids, &config);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            olsr.choose_mpr(&neighbors, &mut rng);
            for (&n, relays) in olsr.mpr() {
                assert!(relays.len() <= neighbors[&n].len());
            }
        }
    }

    #[test]
    fn proactive_flooding_establishes_a_route_along_a_chain() {
        let neighbors = chain_topology();
        let node_ids = [0, 1, 2, 3, 4];
        let config = SimConfig::default();
        let mut olsr = Olsr::new(0, 4, &node_ids, &config);
        let mut rng = StdRng::seed_from_u64(3);
        olsr.choose_mpr(&neighbors, &mut rng);

        for slot in 0..20u64 {
            if olsr.is_finished() {
                break;
            }
            olsr.step(slot, &neighbors, &node_ids);
        }

        assert!(olsr.is_finished(), "olsr never found a route along the chain");
        assert!(olsr.result().overhead > 0);
    }

    #[test]
    fn routing_tables_are_monotonically_non_decreasing() {
        let neighbors = chain_topology();
        let node_ids = [0, 1, 2, 3, 4];
        let config = SimConfig::default();
        let mut olsr = Olsr::new(0, 4, &node_ids, &config);
        let mut rng = StdRng::seed_from_u64(11);
        olsr.choose_mpr(&neighbors, &mut rng);

        let mut last: HashMap<(NodeId, NodeId), i64> = HashMap::new();
        for slot in 0..20u64 {
            if olsr.is_finished() {
                break;
            }
            olsr.step(slot, &neighbors, &node_ids);
            for (&node, table) in olsr.routing_tables() {
                for (&dst, &ts) in table {
                    if let Some(&prev) = last.get(&(node, dst)) {
                        assert!(ts >= prev, "routing_tables[{node}][{dst}] decreased");
                    }
                    last.insert((node, dst), ts);
                }
            }
        }
    }
}
