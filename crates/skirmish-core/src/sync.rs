//! State hashing and cross-peer desync detection.
//!
//! The hash covers everything that can influence future ticks: the tick
//! counter, the next actor id, and every actor's complete record (trait
//! state and activity queue included), encoded with `serde_json` in
//! creation order.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use skirmish_types::PlayerId;
use tracing::error;

use crate::world::{ActorRecord, World};

#[derive(Serialize)]
struct HashedState<'a> {
    tick: u64,
    next_id: u32,
    actors: &'a [ActorRecord],
}

/// SHA-256 (hex) of the simulation state after `tick` ticks.
///
/// # Errors
///
/// Returns the encoding error if the state cannot be serialized.
pub fn state_hash(world: &World, tick: u64) -> Result<String, serde_json::Error> {
    let actors = world.records();
    let bytes = serde_json::to_vec(&HashedState {
        tick,
        next_id: world.next_id(),
        actors: &actors,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Hash divergence between participants. Ends the match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DesyncError {
    /// Two participants reported different hashes for the same tick.
    #[error(
        "determinism violation at tick {tick}: {expected_player} has {expected}, {player} has {found}"
    )]
    DeterminismViolation {
        /// The tick whose hashes differ.
        tick: u64,
        /// A participant that already reported the tick.
        expected_player: PlayerId,
        /// Its hash.
        expected: String,
        /// The participant that disagrees.
        player: PlayerId,
        /// Its hash.
        found: String,
    },
}

/// Collects per-tick hashes from every participant and compares them.
#[derive(Debug, Default)]
pub struct SyncChecker {
    reports: BTreeMap<u64, BTreeMap<PlayerId, String>>,
}

impl SyncChecker {
    /// An empty checker.
    pub const fn new() -> Self {
        Self {
            reports: BTreeMap::new(),
        }
    }

    /// Record `player`'s hash for `tick`.
    ///
    /// Every hash accepted for a tick agrees, so any other participant that
    /// already reported serves as the reference. A player reporting the same
    /// tick again replaces its own entry.
    ///
    /// # Errors
    ///
    /// Returns [`DesyncError::DeterminismViolation`] if `hash` differs from
    /// another participant's hash for the same tick.
    pub fn report(
        &mut self,
        player: PlayerId,
        tick: u64,
        hash: impl Into<String>,
    ) -> Result<(), DesyncError> {
        let hash = hash.into();
        let reports = self.reports.entry(tick).or_default();
        let reference = reports
            .iter()
            .find(|(other, _)| **other != player)
            .map(|(other, expected)| (*other, expected.clone()));

        if let Some((expected_player, expected)) = reference.filter(|(_, expected)| *expected != hash) {
            error!(tick, %expected_player, %expected, %player, found = %hash, "desync detected");
            return Err(DesyncError::DeterminismViolation {
                tick,
                expected_player,
                expected,
                player,
                found: hash,
            });
        }
        reports.insert(player, hash);
        Ok(())
    }

    /// How many participants have reported `tick`.
    pub fn reported(&self, tick: u64) -> usize {
        self.reports.get(&tick).map_or(0, BTreeMap::len)
    }

    /// Drop reports for every tick before `tick`.
    pub fn forget_before(&mut self, tick: u64) {
        self.reports = self.reports.split_off(&tick);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::WorldPos;

    use crate::traits::TraitRegistry;
    use crate::world::ActorInit;

    const RULES: &str = r"
actors:
  tank:
    traits:
      - Mobile: {}
      - Health: { max_hp: 50 }
";

    #[test]
    fn hash_depends_on_tick_and_state() {
        let registry = TraitRegistry::from_yaml(RULES).unwrap();
        let mut world = World::new();
        let empty = state_hash(&world, 0).unwrap();
        assert_eq!(empty.len(), 64);
        assert_eq!(empty, state_hash(&world, 0).unwrap());
        assert_ne!(empty, state_hash(&world, 1).unwrap());

        world
            .spawn(&registry, &ActorInit::new("tank", PlayerId::new(1), WorldPos::ORIGIN))
            .unwrap();
        assert_ne!(empty, state_hash(&world, 0).unwrap());
    }

    #[test]
    fn matching_reports_pass() {
        let mut checker = SyncChecker::new();
        checker.report(PlayerId::new(1), 4, "abc").unwrap();
        checker.report(PlayerId::new(2), 4, "abc").unwrap();
        assert_eq!(checker.reported(4), 2);
    }

    #[test]
    fn divergent_report_is_a_violation() {
        let mut checker = SyncChecker::new();
        checker.report(PlayerId::new(2), 7, "aaaa").unwrap();
        let err = checker.report(PlayerId::new(1), 7, "bbbb").unwrap_err();
        assert_eq!(
            err,
            DesyncError::DeterminismViolation {
                tick: 7,
                expected_player: PlayerId::new(2),
                expected: "aaaa".into(),
                player: PlayerId::new(1),
                found: "bbbb".into(),
            }
        );
        assert_eq!(checker.reported(7), 1);
    }

    #[test]
    fn forget_before_drops_old_ticks() {
        let mut checker = SyncChecker::new();
        for tick in 0..5 {
            checker.report(PlayerId::new(1), tick, "h").unwrap();
        }
        checker.forget_before(3);
        assert_eq!(checker.reported(2), 0);
        assert_eq!(checker.reported(3), 1);
    }
}
