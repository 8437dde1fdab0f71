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

//! Custom: mobility-aware reactive routing.
//!
//! Behaves like [`aodv`](crate::protocol::aodv) except that a forwarding
//! node only ever offers a `RouteRequest` to its `custom_degree` *most
//! stable* neighbors (the ones that have moved least since the run began,
//! stable-sorted ascending by cumulative movement count), and a
//! `RouteReply` that finds its intended next hop has wandered out of range
//! falls back to a bounded, deduplicated broadcast towards the source
//! instead of simply stalling.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::SimConfig;
use crate::node::NodeId;
use crate::packet::Packet;
use crate::protocol::{Engine, EngineResult, Metrics};
use crate::queue::QueueHolder;

/// Mobility-aware reactive engine.
#[derive(Debug, Clone)]
pub struct Custom {
    source: NodeId,
    target: NodeId,
    timeout: u64,
    retry_limit: u32,
    custom_degree: usize,
    queue_capacity: usize,
    queues: QueueHolder,
    /// Cumulative per-node movement count, fed by [`Custom::record_movement`]
    /// after every [`Grid::mutate`](crate::grid::Grid::mutate).
    graph_nums: HashMap<NodeId, u64>,
    /// Last RREQ timestamp forwarded to (and accepted by) each node.
    received: HashMap<NodeId, u64>,
    /// Nodes that have already been offered the broadcast `RouteReply`,
    /// once the reply has fallen back to broadcast mode.
    reply_received: HashMap<NodeId, HashSet<NodeId>>,
    destination_reached: bool,
    broken_path: bool,
    last_timeout: u64,
    metrics: Metrics,
}

impl Custom {
    /// Build a new Custom engine and enqueue the initial `RouteRequest` at
    /// `source`.
    pub fn new(source: NodeId, target: NodeId, node_ids: &[NodeId], config: &SimConfig) -> Self {
        let mut queues = QueueHolder::new(node_ids.iter().copied(), config.queue_capacity);
        if let Some(q) = queues.get_mut(source) {
            q.push_back(Packet::route_request(0, source, target));
        }
        Self {
            source,
            target,
            timeout: config.aodv_timeout,
            retry_limit: config.retry_limit,
            custom_degree: config.custom_degree,
            queue_capacity: config.queue_capacity,
            queues,
            graph_nums: node_ids.iter().map(|&n| (n, 0)).collect(),
            received: HashMap::new(),
            reply_received: HashMap::new(),
            destination_reached: false,
            broken_path: false,
            last_timeout: 0,
            metrics: Metrics::default(),
        }
    }

    /// Cumulative per-node movement counts used to rank neighbor stability.
    pub fn graph_nums(&self) -> &HashMap<NodeId, u64> {
        &self.graph_nums
    }

    /// `true` once a `RouteReply` has fallen back to broadcast mode because
    /// its intended next hop had moved out of range.
    pub fn broken_path(&self) -> bool {
        self.broken_path
    }

    /// Fold per-node movement counts (as reported by a grid mutation) into
    /// the cumulative totals used to rank neighbor stability.
    pub fn record_movement(&mut self, deltas: &HashMap<NodeId, u64>) {
        for (&node, &delta) in deltas {
            *self.graph_nums.entry(node).or_insert(0) += delta;
        }
    }

    fn begin_discover(&mut self, time_slot: u64) {
        if let Some(q) = self.queues.get_mut(self.source) {
            q.push_back(Packet::route_request(time_slot, self.source, self.target));
        }
    }

    /// `neighbors` stable-sorted ascending by cumulative movement count (the
    /// least-moved, most stable neighbors first).
    fn stable_order(&self, neighbors: &[NodeId]) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = neighbors.to_vec();
        order.sort_by_key(|n| self.graph_nums.get(n).copied().unwrap_or(0));
        order
    }

    fn process(&mut self, node: NodeId, neighbors: &[NodeId], time_slot: u64) {
        let Some(mut packet) = self.queues.get_mut(node).and_then(|q| q.pop_front()) else {
            return;
        };
        let mut sent = false;
        let mut overhead = 0u64;

        match &packet {
            Packet::RouteRequest { .. } => {
                let order = self.stable_order(neighbors);
                let mut offered = 0usize;
                for m in order {
                    if offered >= self.custom_degree {
                        break;
                    }
                    if m == self.target && !self.destination_reached {
                        self.destination_reached = true;
                        let reply = Packet::route_reply(time_slot, packet.path());
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_back(reply);
                        }
                        overhead += 1;
                        sent = true;
                        offered += 1;
                        continue;
                    }
                    let ts = packet.header().timestamp;
                    let stale = self.received.get(&m).map(|&last| last >= ts).unwrap_or(false);
                    if stale {
                        continue;
                    }
                    let copy = packet.forwarded_with(m);
                    if let Some(q) = self.queues.get_mut(m) {
                        q.push_back(copy);
                    }
                    self.received.insert(m, ts);
                    overhead += 1;
                    sent = true;
                    offered += 1;
                }
            }
            Packet::RouteReply { .. } => {
                for &m in neighbors {
                    if Some(m) == packet.header().destination {
                        self.metrics.record_overhead(overhead);
                        self.metrics.finish(time_slot);
                        debug!(
                            "custom: reply reached source {} at slot {time_slot}",
                            self.source
                        );
                        return;
                    }
                }
                let intended_next = packet.path().first().copied();
                let next_is_neighbor = intended_next
                    .map(|n| neighbors.contains(&n))
                    .unwrap_or(false);

                if !self.broken_path && next_is_neighbor {
                    let m = intended_next.expect("checked above");
                    if packet.header().retransmits <= self.retry_limit {
                        if let Packet::RouteReply { path, .. } = &mut packet {
                            path.remove(0);
                        }
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_back(packet.clone());
                        }
                        overhead += 1;
                        sent = true;
                    }
                } else {
                    self.broken_path = true;
                    let seen = self.reply_received.entry(node).or_default();
                    let mut offered = 0usize;
                    let mut newly_seen = Vec::new();
                    for &m in neighbors {
                        if offered >= self.custom_degree {
                            break;
                        }
                        if seen.contains(&m) {
                            continue;
                        }
                        newly_seen.push(m);
                        offered += 1;
                    }
                    for m in newly_seen {
                        let copy = packet.forwarded_with(m);
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_front(copy);
                        }
                        self.reply_received.entry(node).or_default().insert(m);
                        overhead += 1;
                        sent = true;
                    }
                }
            }
            Packet::LinkState { .. } => unreachable!("Custom never handles LinkState packets"),
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

impl Engine for Custom {
    fn step(
        &mut self,
        time_slot: u64,
        neighbors: &HashMap<NodeId, Vec<NodeId>>,
        transmitters: &[NodeId],
    ) {
        if self.is_finished() {
            return;
        }
        if time_slot.saturating_sub(self.last_timeout) > self.timeout {
            self.begin_discover(time_slot);
            self.last_timeout = time_slot;
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
            let node_neighbors = neighbors.get(&node).unwrap_or(&empty).clone();
            self.process(node, &node_neighbors, time_slot);
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
