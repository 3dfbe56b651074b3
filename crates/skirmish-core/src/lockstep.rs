//! The lockstep barrier.
//!
//! Orders issued locally on tick `N` are stamped for tick
//! `N + order_latency` and sent to every peer; a tick only runs once every
//! participant's batch for it has arrived. The first `order_latency` ticks
//! can never carry orders and are run as empty ticks without waiting.

use std::collections::{BTreeMap, BTreeSet};

use skirmish_types::{Order, OrderBatch, PlayerId};
use tracing::{debug, warn};

use crate::tick::{Simulation, TickError, TickSummary};

/// Errors from the lockstep barrier.
#[derive(Debug, thiserror::Error)]
pub enum LockstepError {
    /// The player is not in this match.
    #[error("player {player} is not a participant")]
    UnknownParticipant {
        /// The unknown player.
        player: PlayerId,
    },

    /// The batch targets a tick that has already run or is running.
    #[error("player {player} submitted for tick {tick}, but tick {current} is already pending")]
    LateSubmission {
        /// The submitting player.
        player: PlayerId,
        /// The tick the batch was for.
        tick: u64,
        /// The pending tick.
        current: u64,
    },

    /// The player already submitted for this tick.
    #[error("player {player} already submitted for tick {tick}")]
    DuplicateSubmission {
        /// The submitting player.
        player: PlayerId,
        /// The tick.
        tick: u64,
    },

    /// Running the tick failed.
    #[error("tick failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Buffers per-player order submissions until a tick is complete.
#[derive(Debug, Clone)]
pub struct Lockstep {
    participants: BTreeSet<PlayerId>,
    order_latency: u64,
    pending: BTreeMap<u64, BTreeMap<PlayerId, Vec<Order>>>,
}

impl Lockstep {
    /// A barrier over `participants` with the given latency in ticks.
    pub fn new(participants: impl IntoIterator<Item = PlayerId>, order_latency: u64) -> Self {
        Self {
            participants: participants.into_iter().collect(),
            order_latency,
            pending: BTreeMap::new(),
        }
    }

    /// The players in this match, ascending.
    pub fn participants(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.participants.iter().copied()
    }

    /// Ticks between issuing an order and resolving it.
    pub const fn order_latency(&self) -> u64 {
        self.order_latency
    }

    /// Stamp the local player's orders, issued while `current_tick` is
    /// pending, and buffer them. Returns the tick they will resolve on.
    ///
    /// Every participant must schedule once per tick, even with no orders.
    ///
    /// # Errors
    ///
    /// See [`Lockstep::submit`]; overflow of the target tick is reported as
    /// [`TickError::TickOverflow`].
    pub fn schedule(
        &mut self,
        current_tick: u64,
        player: PlayerId,
        orders: Vec<Order>,
    ) -> Result<u64, LockstepError> {
        let tick = current_tick
            .checked_add(self.order_latency)
            .ok_or(TickError::TickOverflow)?;
        self.submit(current_tick, player, tick, orders)?;
        Ok(tick)
    }

    /// Accept `player`'s batch for `tick` while `current_tick` is pending.
    ///
    /// # Errors
    ///
    /// Returns [`LockstepError::UnknownParticipant`],
    /// [`LockstepError::LateSubmission`] if `tick` is before
    /// `current_tick`, or [`LockstepError::DuplicateSubmission`].
    pub fn submit(
        &mut self,
        current_tick: u64,
        player: PlayerId,
        tick: u64,
        orders: Vec<Order>,
    ) -> Result<(), LockstepError> {
        if !self.participants.contains(&player) {
            warn!(%player, tick, "submission from unknown participant rejected");
            return Err(LockstepError::UnknownParticipant { player });
        }
        if tick < current_tick {
            warn!(%player, tick, current_tick, "late submission rejected");
            return Err(LockstepError::LateSubmission {
                player,
                tick,
                current: current_tick,
            });
        }
        let slot = self.pending.entry(tick).or_default();
        if slot.contains_key(&player) {
            warn!(%player, tick, "duplicate submission rejected");
            return Err(LockstepError::DuplicateSubmission { player, tick });
        }
        debug!(%player, tick, orders = orders.len(), "submission buffered");
        slot.insert(player, orders);
        Ok(())
    }

    /// Whether every participant has submitted for `tick`.
    pub fn is_ready(&self, tick: u64) -> bool {
        tick < self.order_latency || self.missing(tick).is_empty()
    }

    /// Participants whose batch for `tick` has not arrived.
    pub fn missing(&self, tick: u64) -> Vec<PlayerId> {
        if tick < self.order_latency {
            return Vec::new();
        }
        let slot = self.pending.get(&tick);
        self.participants
            .iter()
            .copied()
            .filter(|player| slot.is_none_or(|slot| !slot.contains_key(player)))
            .collect()
    }

    /// Remove and return the complete batch for `tick`, or `None` if a
    /// participant is still missing.
    pub fn take_batch(&mut self, tick: u64) -> Option<OrderBatch> {
        if !self.is_ready(tick) {
            return None;
        }
        let mut batch = OrderBatch::new(tick);
        for (player, orders) in self.pending.remove(&tick).unwrap_or_default() {
            batch.extend(player, orders);
        }
        Some(batch)
    }

    /// Run `sim`'s pending tick if its batch is complete.
    ///
    /// Returns `Ok(None)` while waiting on a participant.
    ///
    /// # Errors
    ///
    /// Returns [`LockstepError::Tick`] if the tick itself fails.
    pub fn try_advance(&mut self, sim: &mut Simulation) -> Result<Option<TickSummary>, LockstepError> {
        let tick = sim.tick();
        let Some(batch) = self.take_batch(tick) else {
            debug!(tick, missing = ?self.missing(tick), "waiting for participants");
            return Ok(None);
        };
        Ok(Some(sim.run_tick(&batch)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::{ActorId, verbs};

    const fn p(raw: u32) -> PlayerId {
        PlayerId::new(raw)
    }

    fn stop() -> Order {
        Order::new(ActorId::new(1), verbs::STOP)
    }

    #[test]
    fn early_ticks_are_implicitly_ready() {
        let lockstep = Lockstep::new([p(1), p(2)], 2);
        assert!(lockstep.is_ready(0));
        assert!(lockstep.is_ready(1));
        assert!(!lockstep.is_ready(2));
        assert_eq!(lockstep.missing(2), vec![p(1), p(2)]);
    }

    #[test]
    fn schedule_stamps_current_plus_latency() {
        let mut lockstep = Lockstep::new([p(1)], 3);
        assert_eq!(lockstep.schedule(4, p(1), vec![stop()]).unwrap(), 7);
        assert!(lockstep.is_ready(7));
    }

    #[test]
    fn batch_orders_players_ascending() {
        let mut lockstep = Lockstep::new([p(1), p(2)], 0);
        let from = |raw: u32| Order::new(ActorId::new(raw), verbs::STOP);
        lockstep.submit(0, p(2), 0, vec![from(20), from(21)]).unwrap();
        assert!(lockstep.take_batch(0).is_none());
        lockstep.submit(0, p(1), 0, vec![from(10), from(11)]).unwrap();

        let batch = lockstep.take_batch(0).unwrap();
        let sequence: Vec<(PlayerId, ActorId)> = batch
            .iter()
            .map(|(player, order)| (player, order.source()))
            .collect();
        assert_eq!(
            sequence,
            vec![
                (p(1), ActorId::new(10)),
                (p(1), ActorId::new(11)),
                (p(2), ActorId::new(20)),
                (p(2), ActorId::new(21)),
            ]
        );
        assert!(lockstep.take_batch(0).is_none());
    }

    #[test]
    fn rejects_unknown_late_and_duplicate() {
        let mut lockstep = Lockstep::new([p(1)], 1);
        assert!(matches!(
            lockstep.submit(0, p(9), 1, vec![]),
            Err(LockstepError::UnknownParticipant { .. })
        ));
        assert!(matches!(
            lockstep.submit(5, p(1), 4, vec![]),
            Err(LockstepError::LateSubmission { tick: 4, current: 5, .. })
        ));
        lockstep.submit(5, p(1), 6, vec![]).unwrap();
        assert!(matches!(
            lockstep.submit(5, p(1), 6, vec![stop()]),
            Err(LockstepError::DuplicateSubmission { tick: 6, .. })
        ));
    }
}
