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

//! # Grid module
//!
//! The [`Grid`] is the topology on which the whole simulation runs: a
//! square integer grid holding a sparse swarm of radio nodes, their
//! neighbor relation (derived from a radio radius), and the mobility model
//! that mutates node positions while preserving swarm connectivity.
//!
//! Modeled on [`Network`](crate)'s role in the teacher library: it owns the
//! topology and hands out borrowed, read-mostly views to the engines that
//! drive the simulation, mutating only between timeslots.

use std::collections::HashMap;

use log::debug;
use petgraph::algo::connected_components;
use petgraph::graphmap::UnGraphMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SimError;
use crate::geometry::Point;
use crate::node::{Node, NodeId};

const MAX_MUTATE_ATTEMPTS_PER_NODE: u32 = 3;

/// A sparse swarm of radio nodes placed on a square grid, with their
/// radio-neighbor relation and a seeded mobility model.
#[derive(Debug, Clone)]
pub struct Grid {
    size: i64,
    radio_radius: f64,
    mobility_radius: f64,
    /// `cells[y][x]` holds the occupant of that cell, if any.
    cells: Vec<Vec<Option<NodeId>>>,
    /// All placed nodes, in creation order.
    devices: Vec<Node>,
    neighbors: HashMap<NodeId, Vec<NodeId>>,
    sparsity: f64,
    rng: StdRng,
}

impl Grid {
    /// Build a grid of side length `size`, placing `floor(size * size / 5)`
    /// nodes at distinct random cells using rejection sampling from a
    /// seeded RNG. `size` must be at least 1; a `size` of 1 places zero
    /// nodes (an empty swarm is the only legal outcome for such a small
    /// grid given the `size * size / 5` rule).
    pub fn new(size: i64, seed: Option<u64>) -> Result<Self, SimError> {
        Self::with_radii(size, seed, 5.0, 5.0)
    }

    /// Like [`Grid::new`], but with explicit radio and mobility radii
    /// instead of the spec-reference default of 5.0 for both.
    pub fn with_radii(
        size: i64,
        seed: Option<u64>,
        radio_radius: f64,
        mobility_radius: f64,
    ) -> Result<Self, SimError> {
        if size < 1 {
            return Err(SimError::GridTooSmall { size });
        }
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let num_nodes = ((size * size) / 5) as usize;
        let mut cells = vec![vec![None; size as usize]; size as usize];
        let mut devices = Vec::with_capacity(num_nodes);

        let mut placed = 0usize;
        while placed < num_nodes {
            let x = rng.gen_range(0..size);
            let y = rng.gen_range(0..size);
            if cells[y as usize][x as usize].is_some() {
                continue;
            }
            let id = placed as NodeId;
            cells[y as usize][x as usize] = Some(id);
            devices.push(Node::new(id, Point::new(x, y)));
            placed += 1;
        }

        let mut grid = Self {
            size,
            radio_radius,
            mobility_radius,
            cells,
            devices,
            neighbors: HashMap::new(),
            sparsity: 0.0,
            rng,
        };
        grid.rebuild_all_neighbors();
        Ok(grid)
    }

    /// Side length of the grid.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// All placed nodes, in creation order.
    pub fn devices(&self) -> &[Node] {
        &self.devices
    }

    /// Node occupying `(x, y)`, if any.
    pub fn occupant(&self, point: Point) -> Option<NodeId> {
        self.cells
            .get(point.y as usize)?
            .get(point.x as usize)
            .copied()
            .flatten()
    }

    /// Current coordinate of `node`, if it exists.
    pub fn coordinate(&self, node: NodeId) -> Option<Point> {
        self.devices.iter().find(|n| n.id() == node).map(|n| n.coordinate())
    }

    /// Current neighbor map: node id -> list of neighbor ids.
    pub fn neighbors(&self) -> &HashMap<NodeId, Vec<NodeId>> {
        &self.neighbors
    }

    /// Mean neighbor-list length over all devices.
    pub fn sparsity(&self) -> f64 {
        self.sparsity
    }

    fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.size && p.y < self.size
    }

    /// Recompute the neighbor list of a single node by scanning the box
    /// `[x-R, x+R] x [y-R, y+R]` (clamped to the grid) for occupied cells
    /// within `radio_radius`, in cell-scan order.
    fn rebuild_neighbors_of(&mut self, node: NodeId) {
        let Some(origin) = self.coordinate(node) else {
            return;
        };
        let r = self.radio_radius.ceil() as i64;
        let x_lo = (origin.x - r).max(0);
        let x_hi = (origin.x + r).min(self.size - 1);
        let y_lo = (origin.y - r).max(0);
        let y_hi = (origin.y + r).min(self.size - 1);

        let mut found = Vec::new();
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                if let Some(other) = self.cells[y as usize][x as usize] {
                    if other == node {
                        continue;
                    }
                    let other_point = Point::new(x, y);
                    if origin.distance(&other_point) <= self.radio_radius {
                        found.push(other);
                    }
                }
            }
        }
        self.neighbors.insert(node, found);
    }

    fn rebuild_all_neighbors(&mut self) {
        let ids: Vec<NodeId> = self.devices.iter().map(Node::id).collect();
        for id in &ids {
            self.rebuild_neighbors_of(*id);
        }
        self.recompute_sparsity();
    }

    fn recompute_sparsity(&mut self) {
        if self.neighbors.is_empty() {
            self.sparsity = 0.0;
            return;
        }
        let total: usize = self.neighbors.values().map(Vec::len).sum();
        self.sparsity = total as f64 / self.neighbors.len() as f64;
    }

    /// Move the occupant of `from` to `to`. Fails (leaving state unchanged)
    /// if `from` is empty, `to` is occupied or out of bounds, or the move
    /// would split the swarm into more than one connected component.
    pub fn move_device(&mut self, from: Point, to: Point) -> Result<(), SimError> {
        if !self.in_bounds(to) {
            return Err(SimError::CellOutOfBounds { x: to.x, y: to.y });
        }
        let Some(node) = self.occupant(from) else {
            return Err(SimError::CellEmpty { x: from.x, y: from.y });
        };
        if self.occupant(to).is_some() {
            return Err(SimError::CellOccupied { x: to.x, y: to.y });
        }

        let prior_neighbors = self.neighbors.get(&node).cloned().unwrap_or_default();

        self.cells[from.y as usize][from.x as usize] = None;
        self.cells[to.y as usize][to.x as usize] = Some(node);
        for n in self.devices.iter_mut() {
            if n.id() == node {
                n.set_coordinate(to);
                break;
            }
        }

        self.rebuild_neighbors_of(node);
        let new_neighbors = self.neighbors.get(&node).cloned().unwrap_or_default();
        for other in prior_neighbors.iter().chain(new_neighbors.iter()) {
            self.rebuild_neighbors_of(*other);
        }
        self.recompute_sparsity();

        if !self.is_single_swarm() {
            // roll back: move the node back and rebuild the affected neighbor sets again.
            self.cells[to.y as usize][to.x as usize] = None;
            self.cells[from.y as usize][from.x as usize] = Some(node);
            for n in self.devices.iter_mut() {
                if n.id() == node {
                    n.set_coordinate(from);
                    break;
                }
            }
            self.rebuild_neighbors_of(node);
            for other in prior_neighbors.iter().chain(new_neighbors.iter()) {
                self.rebuild_neighbors_of(*other);
            }
            self.recompute_sparsity();
            return Err(SimError::WouldSplitSwarm);
        }

        Ok(())
    }

    /// Attempt a single-cell mobility step for every device, in arrival
    /// order, retrying devices that fail up to twice (their first attempt,
    /// plus one re-queued retry). Devices that cannot find a legal move
    /// stay put. Returns a movement delta: 1 for a node that moved this
    /// call, 0 otherwise, indexed by node id order `0..num_devices`.
    pub fn mutate(&mut self) -> Vec<u8> {
        let ids: Vec<NodeId> = self.devices.iter().map(Node::id).collect();
        let mut moved = vec![0u8; ids.len()];
        let mut pending = ids.clone();
        let mut round = 0;
        while !pending.is_empty() && round < 2 {
            let mut retry = Vec::new();
            for node in pending {
                if self.try_move_once(node) {
                    moved[node as usize] = 1;
                } else {
                    retry.push(node);
                }
            }
            pending = retry;
            round += 1;
        }
        moved
    }

    /// Try up to `MAX_MUTATE_ATTEMPTS_PER_NODE` random single-cell
    /// displacements for `node` within its mobility radius; returns `true`
    /// iff one succeeded.
    fn try_move_once(&mut self, node: NodeId) -> bool {
        let Some(origin) = self.coordinate(node) else {
            return false;
        };
        let r = self.mobility_radius.floor().max(1.0) as i64;
        for _ in 0..MAX_MUTATE_ATTEMPTS_PER_NODE {
            let dx = self.rng.gen_range(-r..=r);
            let dy = self.rng.gen_range(-r..=r);
            if dx == 0 && dy == 0 {
                continue;
            }
            let candidate = Point::new(origin.x + dx, origin.y + dy);
            if !self.in_bounds(candidate) {
                continue;
            }
            if self.occupant(candidate).is_some() {
                continue;
            }
            match self.move_device(origin, candidate) {
                Ok(()) => return true,
                Err(SimError::WouldSplitSwarm) => continue,
                Err(e) => {
                    debug!("mutate: rejected candidate move for node {node}: {e}");
                    continue;
                }
            }
        }
        false
    }

    /// `true` iff the swarm graph induced by the neighbor relation is a
    /// single connected component (vacuously true for zero or one nodes).
    pub fn is_single_swarm(&self) -> bool {
        if self.devices.len() <= 1 {
            return true;
        }
        let mut graph: UnGraphMap<NodeId, ()> = UnGraphMap::new();
        for node in self.devices.iter().map(Node::id) {
            graph.add_node(node);
        }
        for (&node, neighbors) in &self.neighbors {
            for &other in neighbors {
                graph.add_edge(node, other, ());
            }
        }
        connected_components(&graph) <= 1
    }

    /// Render the grid as one line per row: `'-'` for empty cells, the
    /// zero-padded node id otherwise. Debug-only convenience, no I/O is
    /// performed by the grid itself.
    pub fn render(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        let width = self.devices.len().max(1).to_string().len();
        for row in &self.cells {
            for cell in row {
                match cell {
                    Some(id) => write!(out, "{id:0width$} ", width = width)?,
                    None => write!(out, "{} ", "-".repeat(width))?,
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_grid_smaller_than_one() {
        assert_eq!(
            Grid::new(0, Some(1)).unwrap_err(),
            SimError::GridTooSmall { size: 0 }
        );
    }

    #[test]
    fn places_expected_node_count() {
        let grid = Grid::new(10, Some(7)).unwrap();
        assert_eq!(grid.devices().len(), (10 * 10) / 5);
    }

    #[test]
    fn no_two_nodes_share_a_cell() {
        let grid = Grid::new(20, Some(3)).unwrap();
        let mut seen = std::collections::HashSet::new();
        for node in grid.devices() {
            assert!(seen.insert(node.coordinate()));
        }
    }

    #[test]
    fn is_single_swarm_after_construction() {
        let grid = Grid::new(20, Some(3)).unwrap();
        assert!(grid.is_single_swarm());
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        let grid = Grid::new(15, Some(5)).unwrap();
        for (&node, neighbors) in grid.neighbors() {
            for &other in neighbors {
                assert!(
                    grid.neighbors()[&other].contains(&node),
                    "neighbor relation not symmetric for {node} <-> {other}"
                );
            }
        }
    }

    #[test]
    fn sparsity_matches_mean_neighbor_count() {
        let grid = Grid::new(15, Some(9)).unwrap();
        let expected: f64 = grid.neighbors().values().map(Vec::len).sum::<usize>() as f64
            / grid.neighbors().len() as f64;
        assert!((grid.sparsity() - expected).abs() < 1e-9);
    }

    #[test]
    fn mutate_preserves_invariants() {
        let mut grid = Grid::new(20, Some(11)).unwrap();
        for _ in 0..100 {
            grid.mutate();
            assert!(grid.is_single_swarm());
            let mut seen = std::collections::HashSet::new();
            for node in grid.devices() {
                assert!(seen.insert(node.coordinate()));
            }
        }
    }

    #[test]
    fn larger_radius_does_not_decrease_sparsity() {
        let small_r = Grid::with_radii(20, Some(42), 3.0, 3.0).unwrap();
        let large_r = Grid::with_radii(20, Some(42), 7.0, 7.0).unwrap();
        assert!(large_r.sparsity() >= small_r.sparsity());
    }
}
