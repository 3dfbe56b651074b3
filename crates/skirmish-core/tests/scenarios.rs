//! Gameplay scenarios run through the full tick cycle.
//!
//! Each test builds its rules in-test, spawns a small map, and drives the
//! simulation with explicit order batches the way the lockstep loop would.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use skirmish_core::activity::{Activity, Callback};
use skirmish_core::orders::{InputEvent, ResolveOutcome, resolve_order, try_issue};
use skirmish_core::rng::SyncRng;
use skirmish_core::traits::{Health, Highlight, TraitRegistry};
use skirmish_core::{ActorInit, Simulation, World};
use skirmish_types::{ActorId, Order, OrderBatch, PlayerId, WorldPos, verbs};

const RULES: &str = r"
actors:
  tank:
    traits:
      - Mobile: { speed: 1 }
      - Health: { max_hp: 100 }
      - AmmoPool@primary: { capacity: 2, reload_ticks: 1 }
      - SeeksRepair: { repair_buildings: [fix, depot] }
  signal:
    traits:
      - Mobile: { speed: 1 }
      - Health: { max_hp: 60 }
      - SeeksRepair: { repair_buildings: [fix] }
      - Highlight@LIGHTS: { verbs: [Enter] }
  fix:
    traits:
      - RepairBay: { hp_per_step: 10, interval_ticks: 1 }
      - RallyPoint: { offset: { x: 3, y: 3 } }
      - Highlight@LIGHTS: { verbs: [Enter], duration_ticks: 4 }
      - Highlight@DOOR: { verbs: [Open], duration_ticks: 4 }
      - Demolishable: {}
  depot:
    traits:
      - RepairBay: { hp_per_step: 10, interval_ticks: 1 }
  silo:
    traits:
      - RepairBay: {}
";

const P1: PlayerId = PlayerId(1);

fn registry() -> Arc<TraitRegistry> {
    Arc::new(TraitRegistry::from_yaml(RULES).unwrap())
}

fn run_empty(sim: &mut Simulation, ticks: u32) {
    for _ in 0..ticks {
        let tick = sim.tick();
        sim.run_tick(&OrderBatch::new(tick)).unwrap();
    }
}

fn hp(sim: &Simulation, id: ActorId) -> u32 {
    sim.world()
        .actor(id)
        .and_then(|actor| actor.traits().get::<Health>())
        .map(|health| health.state().hp())
        .unwrap()
}

/// Spawn a damaged tank at (0,5) and a `building` at (5,5), and right-click
/// the building with the tank selected.
fn enter_building(building: &str) -> (Simulation, ActorId, ActorId, Order) {
    let mut sim = Simulation::new(registry(), 42);
    let tank = sim
        .spawn(ActorInit::new("tank", P1, WorldPos::new(0, 5)).with_hp(50))
        .unwrap();
    let bay = sim
        .spawn(ActorInit::new(building, P1, WorldPos::new(5, 5)))
        .unwrap();
    let order = try_issue(
        &InputEvent::right_click(P1),
        tank,
        Some(bay),
        Some(WorldPos::new(5, 5)),
        sim.world(),
    )
    .expect("right-click on an own repair building issues Enter");
    (sim, tank, bay, order)
}

#[test]
fn repair_visit_ends_at_the_rally_point() {
    let (mut sim, tank, bay, order) = enter_building("fix");
    assert_eq!(order.verb(), verbs::ENTER);
    assert_eq!(order.target_actor(), Some(bay));

    let mut batch = OrderBatch::new(0);
    batch.push(P1, order);
    sim.run_tick(&batch).unwrap();

    let queued: Vec<Activity> = sim
        .world()
        .actor(tank)
        .unwrap()
        .activities()
        .iter()
        .cloned()
        .collect();
    assert_eq!(
        queued,
        vec![
            Activity::move_to(WorldPos::new(5, 5)),
            Activity::rearm(bay),
            Activity::repair(bay),
            Activity::call(Callback::QueueMove(WorldPos::new(8, 8))),
        ]
    );

    run_empty(&mut sim, 30);
    let actor = sim.world().actor(tank).unwrap();
    assert_eq!(actor.position(), WorldPos::new(8, 8));
    assert!(actor.activities().is_idle());
    assert_eq!(hp(&sim, tank), 100);
}

#[test]
fn repair_visit_without_rally_point_stays_on_the_bay() {
    let (mut sim, tank, bay, order) = enter_building("depot");

    let mut batch = OrderBatch::new(0);
    batch.push(P1, order);
    sim.run_tick(&batch).unwrap();
    let queued: Vec<Activity> = sim
        .world()
        .actor(tank)
        .unwrap()
        .activities()
        .iter()
        .cloned()
        .collect();
    assert_eq!(
        queued,
        vec![
            Activity::move_to(WorldPos::new(5, 5)),
            Activity::rearm(bay),
            Activity::repair(bay),
        ]
    );

    run_empty(&mut sim, 30);
    let actor = sim.world().actor(tank).unwrap();
    assert_eq!(actor.position(), WorldPos::new(5, 5));
    assert!(actor.activities().is_idle());
    assert_eq!(hp(&sim, tank), 100);
}

#[test]
fn unlisted_building_issues_nothing() {
    let mut sim = Simulation::new(registry(), 42);
    let tank = sim
        .spawn(ActorInit::new("tank", P1, WorldPos::ORIGIN).with_hp(50))
        .unwrap();
    let silo = sim
        .spawn(ActorInit::new("silo", P1, WorldPos::new(3, 0)))
        .unwrap();

    let issued = try_issue(
        &InputEvent::right_click(P1),
        tank,
        Some(silo),
        Some(WorldPos::new(3, 0)),
        sim.world(),
    );
    assert_eq!(issued, None);
}

#[test]
fn enemy_building_issues_nothing() {
    let mut sim = Simulation::new(registry(), 42);
    let tank = sim.spawn(ActorInit::new("tank", P1, WorldPos::ORIGIN)).unwrap();
    let fix = sim
        .spawn(ActorInit::new("fix", PlayerId(2), WorldPos::new(3, 0)))
        .unwrap();

    let issued = try_issue(&InputEvent::right_click(P1), tank, Some(fix), None, sim.world());
    assert_eq!(issued, None);
}

#[test]
fn shift_click_on_ground_queues_a_move() {
    let mut sim = Simulation::new(registry(), 42);
    let tank = sim.spawn(ActorInit::new("tank", P1, WorldPos::ORIGIN)).unwrap();

    let order = try_issue(
        &InputEvent::right_click(P1).with_shift(),
        tank,
        None,
        Some(WorldPos::new(4, 4)),
        sim.world(),
    )
    .unwrap();
    assert_eq!(order.verb(), verbs::MOVE);
    assert!(order.is_queued());
}

#[test]
fn only_the_trait_handling_the_verb_changes() {
    let registry = registry();
    let mut world = World::new();
    let fix = world
        .spawn(&registry, &ActorInit::new("fix", P1, WorldPos::ORIGIN))
        .unwrap();
    let before = world.actor(fix).unwrap().record();

    let mut rng = SyncRng::for_tick(1, 0);
    let outcome = resolve_order(&mut world, P1, &Order::new(fix, verbs::ENTER), &mut rng, 0);
    assert_eq!(outcome, ResolveOutcome::Applied { traits: 1 });

    let actor = world.actor(fix).unwrap();
    let lights = actor.traits().get_qualified::<Highlight>("LIGHTS").unwrap();
    let door = actor.traits().get_qualified::<Highlight>("DOOR").unwrap();
    assert!(lights.state().is_flashing());
    assert!(!door.state().is_flashing());

    let after = actor.record();
    let changed = before
        .traits
        .iter()
        .zip(&after.traits)
        .filter(|(old, new)| old.state != new.state)
        .count();
    assert_eq!(changed, 1);
}

#[test]
fn every_trait_handling_the_verb_applies() {
    let registry = registry();
    let mut world = World::new();
    let signal = world
        .spawn(&registry, &ActorInit::new("signal", P1, WorldPos::ORIGIN).with_hp(20))
        .unwrap();
    let fix = world
        .spawn(&registry, &ActorInit::new("fix", P1, WorldPos::new(5, 5)))
        .unwrap();

    let enter = Order::new(signal, verbs::ENTER).with_target_actor(fix);
    let mut rng = SyncRng::for_tick(1, 0);
    let outcome = resolve_order(&mut world, P1, &enter, &mut rng, 0);
    assert_eq!(outcome, ResolveOutcome::Applied { traits: 2 });

    let actor = world.actor(signal).unwrap();
    let lights = actor.traits().get_qualified::<Highlight>("LIGHTS").unwrap();
    assert!(lights.state().is_flashing());

    let queued: Vec<Activity> = actor.activities().iter().cloned().collect();
    assert_eq!(
        queued,
        vec![
            Activity::move_to(WorldPos::new(5, 5)),
            Activity::rearm(fix),
            Activity::repair(fix),
            Activity::call(Callback::QueueMove(WorldPos::new(8, 8))),
        ]
    );
}

#[test]
fn unknown_verb_is_a_capability_mismatch() {
    let registry = registry();
    let mut world = World::new();
    let depot = world
        .spawn(&registry, &ActorInit::new("depot", P1, WorldPos::ORIGIN))
        .unwrap();
    let before = world.records();

    let mut rng = SyncRng::for_tick(1, 0);
    let outcome = resolve_order(&mut world, P1, &Order::new(depot, "Fly"), &mut rng, 0);
    assert_eq!(outcome, ResolveOutcome::CapabilityMismatch);
    assert_eq!(world.records(), before);
}

#[test]
fn order_against_target_destroyed_this_tick_is_a_no_op() {
    let (mut sim, tank, bay, enter) = enter_building("fix");

    let mut batch = OrderBatch::new(0);
    batch.push(P1, Order::new(bay, verbs::DEMOLISH));
    batch.push(P1, enter);
    let summary = sim.run_tick(&batch).unwrap();

    assert_eq!(summary.removed, vec![bay]);
    let actor = sim.world().actor(tank).unwrap();
    assert!(actor.activities().is_idle());
    assert_eq!(actor.position(), WorldPos::new(0, 5));
    assert!(!sim.world().contains(bay));
}

#[test]
fn orders_for_a_swept_actor_are_ignored() {
    let (mut sim, tank, bay, _) = enter_building("fix");
    let mut batch = OrderBatch::new(0);
    batch.push(P1, Order::new(bay, verbs::DEMOLISH));
    sim.run_tick(&batch).unwrap();

    let before = sim.world().records();
    let mut stale = OrderBatch::new(1);
    stale.push(P1, Order::new(bay, verbs::SET_RALLY_POINT).with_target_location(WorldPos::ORIGIN));
    let summary = sim.run_tick(&stale).unwrap();
    assert_eq!((summary.applied, summary.ignored), (0, 1));
    assert_eq!(sim.world().records(), before);
    assert!(sim.world().contains(tank));
}

#[test]
fn stop_discards_the_repair_visit() {
    let (mut sim, tank, _, enter) = enter_building("fix");
    let mut batch = OrderBatch::new(0);
    batch.push(P1, enter);
    sim.run_tick(&batch).unwrap();

    let mut stop = OrderBatch::new(1);
    stop.push(P1, Order::new(tank, verbs::STOP));
    sim.run_tick(&stop).unwrap();

    let actor = sim.world().actor(tank).unwrap();
    assert!(actor.activities().is_idle());
    assert_eq!(actor.position(), WorldPos::new(1, 5));
}

#[test]
fn rally_point_set_before_the_visit_is_used() {
    let (mut sim, tank, bay, enter) = enter_building("fix");

    let mut batch = OrderBatch::new(0);
    batch.push(
        P1,
        Order::new(bay, verbs::SET_RALLY_POINT).with_target_location(WorldPos::new(2, 9)),
    );
    batch.push(P1, enter);
    sim.run_tick(&batch).unwrap();

    run_empty(&mut sim, 30);
    assert_eq!(sim.world().actor(tank).unwrap().position(), WorldPos::new(2, 9));
}
