//! In-process lockstep peers.
//!
//! Each peer is one participant's machine: its own [`Simulation`] replica
//! and [`Lockstep`] buffer. Players are assigned to peers round-robin; every
//! tick each peer schedules its players' scripted orders and broadcasts the
//! stamped batches to all other peers, exactly as a network layer would.

use std::sync::Arc;

use skirmish_core::config::SessionConfig;
use skirmish_core::lockstep::Lockstep;
use skirmish_core::traits::TraitRegistry;
use skirmish_core::{Simulation, TickSummary};
use skirmish_types::{Order, PlayerId};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::scenario::Scenario;

/// One participant machine.
pub struct Peer {
    /// Identity used for hash reports: the first hosted player.
    pub host: PlayerId,
    /// Players whose input this peer submits.
    pub players: Vec<PlayerId>,
    /// The local replica.
    pub sim: Simulation,
    /// The local order buffer.
    pub lockstep: Lockstep,
}

impl Peer {
    /// Run the local replica's pending tick if its batch is complete.
    pub fn advance(&mut self) -> Result<Option<TickSummary>, EngineError> {
        Ok(self.lockstep.try_advance(&mut self.sim)?)
    }
}

/// Build `session.peers` replicas of the scenario's opening position.
pub fn build(
    session: &SessionConfig,
    registry: &Arc<TraitRegistry>,
    scenario: &Scenario,
) -> Result<Vec<Peer>, EngineError> {
    let wanted = usize::try_from(session.peers).unwrap_or(usize::MAX).max(1);
    let count = wanted.min(scenario.players.len());
    if count < wanted {
        warn!(
            requested = wanted,
            players = scenario.players.len(),
            "more peers than players requested, clamping"
        );
    }

    let mut hosted: Vec<Vec<PlayerId>> = vec![Vec::new(); count];
    for (player, slot) in scenario.players.iter().zip((0..count).cycle()) {
        if let Some(players) = hosted.get_mut(slot) {
            players.push(*player);
        }
    }

    let mut peers = Vec::with_capacity(count);
    for players in hosted {
        let Some(&host) = players.first() else {
            continue;
        };
        let mut sim = Simulation::new(Arc::clone(registry), session.seed)
            .with_hash_interval(session.hash_interval);
        for init in &scenario.actors {
            sim.spawn(init.clone())?;
        }
        info!(%host, players = ?players, actors = sim.world().len(), "peer ready");
        peers.push(Peer {
            host,
            players,
            sim,
            lockstep: Lockstep::new(scenario.players.iter().copied(), session.order_latency),
        });
    }
    Ok(peers)
}

/// Schedule every hosted player's orders for the current tick and deliver
/// them to every other peer.
pub fn exchange(peers: &mut [Peer], scenario: &Scenario) -> Result<(), EngineError> {
    let mut outgoing: Vec<(usize, u64, PlayerId, u64, Vec<Order>)> = Vec::new();
    for (index, peer) in peers.iter_mut().enumerate() {
        let current = peer.sim.tick();
        for &player in &peer.players {
            let orders = scenario.orders_for(player, current);
            let target = peer.lockstep.schedule(current, player, orders.clone())?;
            outgoing.push((index, current, player, target, orders));
        }
    }
    for (sender, current, player, target, orders) in outgoing {
        for (index, peer) in peers.iter_mut().enumerate() {
            if index != sender {
                peer.lockstep.submit(current, player, target, orders.clone())?;
            }
        }
    }
    Ok(())
}
