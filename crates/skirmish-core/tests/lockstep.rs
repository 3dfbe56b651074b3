//! Multi-peer determinism: several simulations fed through the lockstep
//! barrier must stay bit-identical, and saves must replay to the same state.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use skirmish_core::lockstep::Lockstep;
use skirmish_core::save::SaveGame;
use skirmish_core::sync::{DesyncError, SyncChecker};
use skirmish_core::traits::TraitRegistry;
use skirmish_core::{ActorInit, Simulation};
use skirmish_types::{ActorId, Order, PlayerId, WorldPos, verbs};

const RULES: &str = r"
actors:
  scout:
    traits:
      - Mobile: { speed: 2 }
      - Health: {}
  charge:
    traits:
      - Demolishable: { delay_ticks: 2, jitter_ticks: 6 }
";

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

struct Peer {
    player: PlayerId,
    sim: Simulation,
    lockstep: Lockstep,
}

fn match_peers(seed: u64) -> Vec<Peer> {
    let registry = Arc::new(TraitRegistry::from_yaml(RULES).unwrap());
    [P1, P2]
        .into_iter()
        .map(|player| {
            let mut sim = Simulation::new(Arc::clone(&registry), seed);
            sim.spawn(ActorInit::new("scout", P1, WorldPos::ORIGIN)).unwrap();
            sim.spawn(ActorInit::new("scout", P2, WorldPos::new(10, 10))).unwrap();
            for x in 0..4 {
                sim.spawn(ActorInit::new("charge", P2, WorldPos::new(x, 0))).unwrap();
            }
            Peer {
                player,
                sim,
                lockstep: Lockstep::new([P1, P2], 2),
            }
        })
        .collect()
}

/// The orders each player issues on a given tick.
fn scripted(player: PlayerId, tick: u64) -> Vec<Order> {
    match (player, tick) {
        (PlayerId(1), 0) => vec![
            Order::new(ActorId(1), verbs::MOVE).with_target_location(WorldPos::new(9, 3)),
        ],
        (PlayerId(2), 1) => (3..=6)
            .map(|id| Order::new(ActorId(id), verbs::DEMOLISH))
            .collect(),
        (PlayerId(2), 4) => vec![
            Order::new(ActorId(2), verbs::MOVE).with_target_location(WorldPos::new(0, 10)),
        ],
        _ => Vec::new(),
    }
}

/// Every peer schedules its own orders and broadcasts them to the others.
fn exchange(peers: &mut [Peer]) {
    let mut outgoing = Vec::new();
    for peer in peers.iter_mut() {
        let current = peer.sim.tick();
        let orders = scripted(peer.player, current);
        let target = peer
            .lockstep
            .schedule(current, peer.player, orders.clone())
            .unwrap();
        outgoing.push((peer.player, current, target, orders));
    }
    for (sender, current, target, orders) in outgoing {
        for peer in peers.iter_mut().filter(|peer| peer.player != sender) {
            peer.lockstep
                .submit(current, sender, target, orders.clone())
                .unwrap();
        }
    }
}

#[test]
fn peers_stay_in_sync_over_many_ticks() {
    let mut peers = match_peers(7);
    let mut checker = SyncChecker::new();

    for _ in 0..24 {
        exchange(&mut peers);
        for peer in &mut peers {
            let summary = peer.lockstep.try_advance(&mut peer.sim).unwrap().unwrap();
            checker
                .report(peer.player, summary.tick, summary.state_hash.unwrap())
                .unwrap();
        }
    }

    let first = peers.first().unwrap();
    assert_eq!(first.sim.tick(), 24);
    // Both scouts and no charges survive.
    assert_eq!(first.sim.world().len(), 2);
    assert_eq!(
        first.sim.world().actor(ActorId(1)).unwrap().position(),
        WorldPos::new(9, 3)
    );
}

#[test]
fn identical_seeds_replay_bit_identically() {
    let hashes = |seed| {
        let mut peers = match_peers(seed);
        let mut out = Vec::new();
        for _ in 0..16 {
            exchange(&mut peers);
            let peer = peers.first_mut().unwrap();
            let summary = peer.lockstep.try_advance(&mut peer.sim).unwrap().unwrap();
            out.push(summary.state_hash.unwrap());
            let other = peers.last_mut().unwrap();
            other.lockstep.try_advance(&mut other.sim).unwrap();
        }
        out
    };
    assert_eq!(hashes(99), hashes(99));
}

#[test]
fn barrier_waits_for_every_participant() {
    let registry = Arc::new(TraitRegistry::from_yaml(RULES).unwrap());
    let mut sim = Simulation::new(registry, 1);
    let mut lockstep = Lockstep::new([P1, P2], 1);

    // Tick 0 is inside the latency window and never waits.
    assert!(lockstep.try_advance(&mut sim).unwrap().is_some());

    lockstep.submit(0, P1, 1, Vec::new()).unwrap();
    assert!(lockstep.try_advance(&mut sim).unwrap().is_none());
    assert_eq!(sim.tick(), 1);
    assert_eq!(lockstep.missing(1), vec![P2]);

    lockstep.submit(1, P2, 1, Vec::new()).unwrap();
    assert!(lockstep.try_advance(&mut sim).unwrap().is_some());
    assert_eq!(sim.tick(), 2);
}

#[test]
fn diverging_peer_is_detected() {
    let mut peers = match_peers(3);
    let mut checker = SyncChecker::new();
    for _ in 0..3 {
        exchange(&mut peers);
        for peer in &mut peers {
            let summary = peer.lockstep.try_advance(&mut peer.sim).unwrap().unwrap();
            checker
                .report(peer.player, summary.tick, summary.state_hash.unwrap())
                .unwrap();
        }
    }

    // Corrupt one peer outside the order protocol.
    peers.last_mut().unwrap().sim.world_mut().kill(ActorId(2));

    exchange(&mut peers);
    let mut results = Vec::new();
    for peer in &mut peers {
        let summary = peer.lockstep.try_advance(&mut peer.sim).unwrap().unwrap();
        results.push(checker.report(peer.player, summary.tick, summary.state_hash.unwrap()));
    }
    assert!(results.first().unwrap().is_ok());
    assert!(matches!(
        results.last().unwrap(),
        Err(DesyncError::DeterminismViolation { tick: 3, player: PlayerId(2), .. })
    ));
}

#[test]
fn save_mid_match_verifies_and_resumes() {
    let mut peers = match_peers(11);
    for _ in 0..6 {
        exchange(&mut peers);
        for peer in &mut peers {
            peer.lockstep.try_advance(&mut peer.sim).unwrap().unwrap();
        }
    }

    let registry = Arc::new(TraitRegistry::from_yaml(RULES).unwrap());
    let peer = peers.first().unwrap();
    let save = SaveGame::from_json(&SaveGame::capture(&peer.sim).to_json().unwrap()).unwrap();
    save.verify(Arc::clone(&registry)).unwrap();

    let restored = save.restore(Arc::clone(&registry)).unwrap();
    let replayed = save.replay(registry).unwrap();
    assert_eq!(restored.state_hash().unwrap(), peer.sim.state_hash().unwrap());
    assert_eq!(replayed.state_hash().unwrap(), peer.sim.state_hash().unwrap());
}
