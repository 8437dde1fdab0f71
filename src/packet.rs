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

//! Control-packet value objects.
//!
//! Modeled as a single tagged [`Packet`] enum with a common [`Header`]
//! rather than a class hierarchy (see Design Note 9.1): engines switch on
//! the variant, and forwarding a packet is a plain [`Clone`]: every
//! receiver's copy has an independently owned `path`.

use crate::node::NodeId;

/// Fields shared by every packet variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Timeslot at which the packet (or, for a retransmitted copy, its
    /// original `RouteRequest`/`LinkState`) was first created.
    pub timestamp: u64,
    /// Originating node.
    pub source: NodeId,
    /// Intended final recipient (absent for `LinkState`, which has no
    /// single destination).
    pub destination: Option<NodeId>,
    /// Number of times this packet has been pushed back to the front of a
    /// queue for retry after a step in which it could not be forwarded.
    pub retransmits: u32,
}

impl Header {
    fn new(timestamp: u64, source: NodeId, destination: Option<NodeId>) -> Self {
        Self {
            timestamp,
            source,
            destination,
            retransmits: 0,
        }
    }
}

/// A control packet exchanged between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// AODV route discovery, reactive flood towards `header.destination`.
    RouteRequest {
        /// Common header.
        header: Header,
        /// Node ids visited so far, in order, source first.
        path: Vec<NodeId>,
    },
    /// AODV route reply, carried back along the reverse of a `RouteRequest`
    /// path.
    RouteReply {
        /// Common header.
        header: Header,
        /// Reverse route from target back to source; consumed head-first
        /// as the reply progresses.
        path: Vec<NodeId>,
    },
    /// OLSR proactive beacon advertising the sender's existence.
    LinkState {
        /// Common header (`destination` is always `None`).
        header: Header,
        /// Ordered list of forwarders the beacon has passed through.
        path: Vec<NodeId>,
    },
}

impl Packet {
    /// Build a fresh `RouteRequest` originated by `source` towards `target`.
    pub fn route_request(timestamp: u64, source: NodeId, target: NodeId) -> Self {
        Packet::RouteRequest {
            header: Header::new(timestamp, source, Some(target)),
            path: vec![source],
        }
    }

    /// Build a `RouteReply` whose `path` is the reverse of a `RouteRequest`
    /// path that reached the target; `header.destination` is the original
    /// requester (`path`'s last entry).
    pub fn route_reply(timestamp: u64, request_path: &[NodeId]) -> Self {
        let mut path: Vec<NodeId> = request_path.to_vec();
        path.reverse();
        let source = *path.first().expect("request path is non-empty");
        let destination = *path.last().expect("request path is non-empty");
        Packet::RouteReply {
            header: Header::new(timestamp, source, Some(destination)),
            path,
        }
    }

    /// Build a fresh `LinkState` beacon originated by `source`.
    pub fn link_state(timestamp: u64, source: NodeId) -> Self {
        Packet::LinkState {
            header: Header::new(timestamp, source, None),
            path: vec![source],
        }
    }

    /// Reference to the common header.
    pub fn header(&self) -> &Header {
        match self {
            Packet::RouteRequest { header, .. }
            | Packet::RouteReply { header, .. }
            | Packet::LinkState { header, .. } => header,
        }
    }

    /// Mutable reference to the common header.
    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            Packet::RouteRequest { header, .. }
            | Packet::RouteReply { header, .. }
            | Packet::LinkState { header, .. } => header,
        }
    }

    /// Reference to the packet's path.
    pub fn path(&self) -> &[NodeId] {
        match self {
            Packet::RouteRequest { path, .. }
            | Packet::RouteReply { path, .. }
            | Packet::LinkState { path, .. } => path,
        }
    }

    /// Deep-copy this packet and append `node` to the copy's path. The
    /// original's path is left untouched.
    pub fn forwarded_with(&self, node: NodeId) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Packet::RouteRequest { path, .. }
            | Packet::RouteReply { path, .. }
            | Packet::LinkState { path, .. } => path.push(node),
        }
        copy
    }

    /// Increment the retransmit counter on this packet (in place).
    pub fn retransmit(&mut self) {
        self.header_mut().retransmits += 1;
    }
}
