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

//! Error taxonomy for the simulator's fallible public surface.
//!
//! Operations the spec defines as "silently drop/reject and retry" (queue
//! overflow, mutation-candidate rejection, stale MPR entries) are normal
//! control flow and never produce a [`SimError`]; only operations the
//! distilled spec calls out as reporting a failure to the caller do.

use thiserror::Error;

/// Errors produced by the public surface of the simulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// `Grid::new` was asked to build a grid with side length zero.
    #[error("grid side length must be at least 1, got {size}")]
    GridTooSmall {
        /// The requested (invalid) side length.
        size: i64,
    },
    /// A placement or move targeted a cell already holding a node.
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied {
        /// Column of the occupied cell.
        x: i64,
        /// Row of the occupied cell.
        y: i64,
    },
    /// A placement or move targeted a cell outside the grid.
    #[error("cell ({x}, {y}) is outside the grid")]
    CellOutOfBounds {
        /// Column of the out-of-bounds cell.
        x: i64,
        /// Row of the out-of-bounds cell.
        y: i64,
    },
    /// A move was requested from a cell with no occupant.
    #[error("cell ({x}, {y}) has no node to move")]
    CellEmpty {
        /// Column of the empty cell.
        x: i64,
        /// Row of the empty cell.
        y: i64,
    },
    /// The requested move would split the swarm into more than one
    /// connected component.
    #[error("move would split the swarm into multiple components")]
    WouldSplitSwarm,
}
