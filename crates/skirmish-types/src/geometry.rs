//! Integer world geometry.
//!
//! Positions are whole cells on a flat grid and facings are one of eight
//! compass directions. Nothing here uses floating point: every participant
//! must compute identical positions regardless of platform or compiler.
//! The y axis grows southwards, matching screen coordinates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A cell position in the world.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct WorldPos {
    /// Column (grows eastwards).
    pub x: i32,
    /// Row (grows southwards).
    pub y: i32,
}

impl WorldPos {
    /// The origin cell `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a position from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance to `other`, in cells.
    pub const fn distance_to(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Move towards `target` by at most `max_step` cells along each axis.
    ///
    /// Returns `target` exactly once it is within reach, so repeated calls
    /// always terminate on the target cell.
    #[must_use]
    pub fn step_toward(self, target: Self, max_step: u32) -> Self {
        let max = i32::try_from(max_step).unwrap_or(i32::MAX);
        Self {
            x: axis_step(self.x, target.x, max),
            y: axis_step(self.y, target.y, max),
        }
    }
}

impl core::fmt::Display for WorldPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

fn axis_step(from: i32, to: i32, max: i32) -> i32 {
    let delta = to.saturating_sub(from);
    from.saturating_add(delta.clamp(max.saturating_neg(), max))
}

/// One of eight compass facings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Facing {
    /// Facing up the map (negative y).
    #[default]
    North,
    /// Facing up and right.
    NorthEast,
    /// Facing right (positive x).
    East,
    /// Facing down and right.
    SouthEast,
    /// Facing down the map (positive y).
    South,
    /// Facing down and left.
    SouthWest,
    /// Facing left (negative x).
    West,
    /// Facing up and left.
    NorthWest,
}

impl Facing {
    /// The facing that points from `from` towards `to`.
    ///
    /// Returns `None` when both positions are the same cell.
    pub const fn toward(from: WorldPos, to: WorldPos) -> Option<Self> {
        let sx = sign(from.x, to.x);
        let sy = sign(from.y, to.y);
        match (sx, sy) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }
}

const fn sign(from: i32, to: i32) -> i8 {
    if to > from {
        1
    } else if to < from {
        -1
    } else {
        0
    }
}
