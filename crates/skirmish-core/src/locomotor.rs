//! The movement seam.
//!
//! Pathfinding and collision live outside the core. Move activities ask a
//! [`Locomotor`] for the next cell and nothing more, so any implementation
//! plugged in here must itself be deterministic.

use skirmish_types::WorldPos;

/// Computes one movement step towards a destination.
pub trait Locomotor: std::fmt::Debug {
    /// The cell an actor at `from` occupies after one tick of moving towards
    /// `to` at `speed` cells per tick.
    ///
    /// Returning `from` means the actor is blocked this tick.
    fn step(&self, from: WorldPos, to: WorldPos, speed: u32) -> WorldPos;
}

/// Moves in a straight eight-way line, ignoring terrain and other actors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl Locomotor for StraightLine {
    fn step(&self, from: WorldPos, to: WorldPos, speed: u32) -> WorldPos {
        from.step_toward(to, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_moves_diagonally_first() {
        let next = StraightLine.step(WorldPos::ORIGIN, WorldPos::new(3, 1), 1);
        assert_eq!(next, WorldPos::new(1, 1));
    }

    #[test]
    fn straight_line_does_not_overshoot() {
        let next = StraightLine.step(WorldPos::new(4, 4), WorldPos::new(5, 5), 3);
        assert_eq!(next, WorldPos::new(5, 5));
    }
}
