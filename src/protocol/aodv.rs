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

//! AODV: reactive on-demand route discovery.
//!
//! A `RouteRequest` floods outward from the source; the first copy to reach
//! the target triggers a `RouteReply` that is carried back hop-by-hop along
//! the reverse of the path that found it. Terminal condition: the reply
//! reaches the source.

use std::collections::HashMap;

use log::debug;

use crate::config::SimConfig;
use crate::node::NodeId;
use crate::packet::Packet;
use crate::protocol::{Engine, EngineResult, Metrics};
use crate::queue::QueueHolder;

/// Reactive AODV engine.
#[derive(Debug, Clone)]
pub struct Aodv {
    source: NodeId,
    target: NodeId,
    timeout: u64,
    retry_limit: u32,
    queue_capacity: usize,
    queues: QueueHolder,
    /// Last RREQ timestamp forwarded to (and accepted by) each node.
    received: HashMap<NodeId, u64>,
    destination_reached: bool,
    /// The reverse of the first `RouteRequest` path to reach `target`, i.e.
    /// the route a `RouteReply` is built from. Recorded once, at discovery.
    discovered_route: Option<Vec<NodeId>>,
    last_timeout: u64,
    metrics: Metrics,
}

impl Aodv {
    /// Build a new AODV engine and enqueue the initial `RouteRequest` at
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
            queue_capacity: config.queue_capacity,
            queues,
            received: HashMap::new(),
            destination_reached: false,
            discovered_route: None,
            last_timeout: 0,
            metrics: Metrics::default(),
        }
    }

    /// The reverse of the `RouteRequest` path that first reached `target`
    /// (the route the `RouteReply` is carried back along), if discovery has
    /// happened yet.
    pub fn discovered_route(&self) -> Option<&[NodeId]> {
        self.discovered_route.as_deref()
    }

    /// Last `RouteRequest` timestamp forwarded to (and accepted by) each
    /// node, keyed by node id.
    pub fn received(&self) -> &HashMap<NodeId, u64> {
        &self.received
    }

    fn begin_discover(&mut self, time_slot: u64) {
        if let Some(q) = self.queues.get_mut(self.source) {
            q.push_back(Packet::route_request(time_slot, self.source, self.target));
        }
    }

    /// Process the packet at the front of `node`'s queue against its
    /// current neighbor list.
    fn process(&mut self, node: NodeId, neighbors: &[NodeId], time_slot: u64) {
        let Some(mut packet) = self.queues.get_mut(node).and_then(|q| q.pop_front()) else {
            return;
        };
        let mut sent = false;
        let mut overhead = 0u64;

        match &packet {
            Packet::RouteRequest { .. } => {
                for &m in neighbors {
                    if m == self.target && !self.destination_reached {
                        self.destination_reached = true;
                        let reply = Packet::route_reply(time_slot, packet.path());
                        self.discovered_route = Some(reply.path().to_vec());
                        if let Some(q) = self.queues.get_mut(m) {
                            q.push_back(reply);
                        }
                        overhead += 1;
                        sent = true;
                    } else {
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
            }
            Packet::RouteReply { .. } => {
                for &m in neighbors {
                    if Some(m) == packet.header().destination {
                        overhead += 1;
                        self.metrics.record_overhead(overhead);
                        self.metrics.finish(time_slot);
                        debug!(
                            "aodv: reply reached source {} at slot {time_slot}",
                            self.source
                        );
                        return;
                    } else if packet.path().first() == Some(&m) {
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
                        break;
                    }
                }
            }
            Packet::LinkState { .. } => unreachable!("AODV never handles LinkState packets"),
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

impl Engine for Aodv {
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
