//! The entity store.
//!
//! Actors live in a `BTreeMap` keyed by [`ActorId`], so every walk over the
//! world visits them in creation order on every machine. Ids are allocated
//! monotonically and never reused within a session.
//!
//! Destruction is deferred: [`World::kill`] only marks an actor dead. Dead
//! actors are invisible to lookups at once and are swept by
//! [`World::remove_dead`] at the end of the tick.
//!
//! While an actor advances or resolves an order it is detached from the map
//! (see [`World::with_detached`]). The detached actor is writable; the rest
//! of the world is only reachable through a shared borrow, so one actor can
//! never write another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skirmish_types::{
    ActivityKind, ActorId, ActorSnapshot, AmmoView, Facing, HealthView, PlayerId, WorldPos,
    WorldSnapshot,
};
use tracing::debug;

use crate::activity::{Activity, ActivityContext, ActivityQueue};
use crate::error::ConfigurationError;
use crate::orders::{OrderSubject, ResolveContext};
use crate::traits::{AmmoPool, Health, Highlight, RallyPoint, TraitKey, TraitRegistry, TraitSet, TraitState};

/// Errors raised by entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The actor type could not be instantiated.
    #[error("spawn failed: {source}")]
    Configuration {
        /// The underlying rules error.
        #[from]
        source: ConfigurationError,
    },

    /// Every `u32` actor id has been handed out.
    #[error("actor id space exhausted")]
    IdSpaceExhausted,

    /// A record names an id that is already present.
    #[error("duplicate actor {0} in records")]
    DuplicateActor(ActorId),

    /// A record's trait state does not fit the registry's declarations.
    #[error("actor {actor}: record does not match rules for `{actor_type}`: {reason}")]
    RecordMismatch {
        /// The offending actor.
        actor: ActorId,
        /// Its actor type.
        actor_type: String,
        /// What does not match.
        reason: String,
    },
}

/// How to create an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInit {
    /// The actor type name in the rules.
    pub actor_type: String,
    /// The owning player.
    pub owner: PlayerId,
    /// The starting cell.
    pub position: WorldPos,
    /// The starting facing.
    #[serde(default)]
    pub facing: Facing,
    /// Starting hit points, clamped to the `Health` maximum. Full when absent.
    #[serde(default)]
    pub hp: Option<u32>,
}

impl ActorInit {
    /// An actor of `actor_type` owned by `owner` at `position`.
    pub fn new(actor_type: impl Into<String>, owner: PlayerId, position: WorldPos) -> Self {
        Self {
            actor_type: actor_type.into(),
            owner,
            position,
            facing: Facing::default(),
            hp: None,
        }
    }

    /// Start with `hp` hit points.
    #[must_use]
    pub const fn with_hp(mut self, hp: u32) -> Self {
        self.hp = Some(hp);
        self
    }
}

/// An actor creation requested by a running activity.
///
/// Requests are collected while actors advance and applied afterwards in
/// the order they were made, which is the producers' creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// The actor whose activity asked for the spawn.
    pub producer: ActorId,
    /// What to create.
    pub init: ActorInit,
    /// Where the new actor heads once it exists.
    pub rally: Option<WorldPos>,
}

/// One trait's state inside an [`ActorRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitRecord {
    /// The instance key.
    pub key: TraitKey,
    /// The instance's state.
    pub state: TraitState,
}

/// The complete simulation state of one actor.
///
/// Records are what the state hash covers and what save games carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Identity.
    pub id: ActorId,
    /// Owning player.
    pub owner: PlayerId,
    /// Actor type name.
    pub actor_type: String,
    /// Current cell.
    pub position: WorldPos,
    /// Current facing.
    pub facing: Facing,
    /// Whether activity advancement is suspended.
    #[serde(default)]
    pub paused: bool,
    /// Destroyed this tick and awaiting the sweep.
    #[serde(default)]
    pub dead: bool,
    /// Trait states in declaration order.
    pub traits: Vec<TraitRecord>,
    /// Queued activities, current first.
    pub activities: Vec<Activity>,
}

/// A simulated game object.
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    owner: PlayerId,
    actor_type: String,
    position: WorldPos,
    facing: Facing,
    traits: TraitSet,
    activities: ActivityQueue,
    dead: bool,
    paused: bool,
}

impl Actor {
    /// Identity.
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Owning player.
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Actor type name.
    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    /// Current cell.
    pub const fn position(&self) -> WorldPos {
        self.position
    }

    /// Current facing.
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the actor has been destroyed this tick.
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether activity advancement is suspended.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// The actor's traits.
    pub const fn traits(&self) -> &TraitSet {
        &self.traits
    }

    /// The actor's traits, mutably.
    pub const fn traits_mut(&mut self) -> &mut TraitSet {
        &mut self.traits
    }

    /// The activity queue.
    pub const fn activities(&self) -> &ActivityQueue {
        &self.activities
    }

    /// Kind of the current activity, `None` when idle.
    pub fn current_activity(&self) -> Option<ActivityKind> {
        self.activities.current_kind()
    }

    /// Discard every queued activity.
    pub fn cancel_activity(&mut self) {
        self.activities.cancel();
    }

    /// Append an activity.
    pub fn queue_activity(&mut self, activity: Activity) {
        self.activities.queue(activity);
    }

    /// Put an activity ahead of the current one.
    pub fn queue_activity_front(&mut self, activity: Activity) {
        self.activities.queue_front(activity);
    }

    pub(crate) const fn set_position(&mut self, position: WorldPos) {
        self.position = position;
    }

    pub(crate) const fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub(crate) fn mark_dead(&mut self) {
        self.dead = true;
        self.activities.cancel();
    }

    /// Offer a resolved order to every trait that resolves its verb, in
    /// declaration order. Returns how many traits were offered the order.
    pub(crate) fn resolve_order(&mut self, ctx: &mut ResolveContext<'_>) -> usize {
        let keys = self.traits.resolvers_for(ctx.order.verb());
        let mut subject = OrderSubject::new(
            self.id,
            self.owner,
            self.position,
            &mut self.activities,
            &mut self.dead,
        );
        for key in &keys {
            if subject.is_dead() {
                break;
            }
            if let Some(instance) = self.traits.instance_mut(key) {
                instance.resolve_order(&mut subject, ctx);
            }
        }
        keys.len()
    }

    /// Step the current activity once. Returns the kind that ran.
    pub(crate) fn advance_activity(
        &mut self,
        ctx: &mut ActivityContext<'_>,
    ) -> Option<ActivityKind> {
        if self.dead || self.paused || self.activities.is_idle() {
            return None;
        }
        let mut queue = std::mem::take(&mut self.activities);
        queue.clear_cancel_latch();
        let ran = queue.advance(self, ctx);
        let during_step = std::mem::replace(&mut self.activities, queue);
        self.activities.absorb(during_step);
        if self.dead {
            self.activities.cancel();
        }
        ran
    }

    pub(crate) fn tick_traits(&mut self) {
        self.traits.tick();
    }

    /// The actor's complete simulation state.
    pub fn record(&self) -> ActorRecord {
        ActorRecord {
            id: self.id,
            owner: self.owner,
            actor_type: self.actor_type.clone(),
            position: self.position,
            facing: self.facing,
            paused: self.paused,
            dead: self.dead,
            traits: self
                .traits
                .iter()
                .map(|instance| TraitRecord {
                    key: instance.key().clone(),
                    state: instance.state().clone(),
                })
                .collect(),
            activities: self.activities.iter().cloned().collect(),
        }
    }

    /// What a renderer may know about this actor.
    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            owner: self.owner,
            actor_type: self.actor_type.clone(),
            position: self.position,
            facing: self.facing,
            activity: self.current_activity(),
            queued_activities: u32::try_from(self.activities.len()).unwrap_or(u32::MAX),
            health: self.traits.get::<Health>().map(|health| HealthView {
                hp: health.state().hp(),
                max_hp: health.info().max_hp,
            }),
            ammo: self
                .traits
                .all::<AmmoPool>()
                .map(|pool| AmmoView {
                    qualifier: pool.qualifier().map(str::to_owned),
                    ammo: pool.state().ammo(),
                    capacity: pool.info().capacity,
                })
                .collect(),
            rally_point: self
                .traits
                .get::<RallyPoint>()
                .and_then(|rally| rally.state().location()),
            highlights: self
                .traits
                .all::<Highlight>()
                .filter(|highlight| highlight.state().is_flashing())
                .map(|highlight| highlight.key().to_string())
                .collect(),
        }
    }
}

/// All actors of one simulation.
#[derive(Debug, Clone)]
pub struct World {
    actors: BTreeMap<ActorId, Actor>,
    next_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// An empty world. The first actor gets id 1.
    pub const fn new() -> Self {
        Self {
            actors: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an actor from the rules.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Configuration`] for an unknown actor type, or
    /// [`WorldError::IdSpaceExhausted`] when no ids are left.
    pub fn spawn(&mut self, registry: &TraitRegistry, init: &ActorInit) -> Result<ActorId, WorldError> {
        let mut traits = registry.create(&init.actor_type)?;
        let id = ActorId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(WorldError::IdSpaceExhausted)?;

        for mut rally in traits.all_mut::<RallyPoint>() {
            let info = rally.info();
            rally.state_mut().place(info, init.position);
        }
        if let (Some(hp), Some(mut health)) = (init.hp, traits.get_mut::<Health>()) {
            let info = health.info();
            health.state_mut().set_hp(info, hp);
        }

        let actor = Actor {
            id,
            owner: init.owner,
            actor_type: init.actor_type.clone(),
            position: init.position,
            facing: init.facing,
            traits,
            activities: ActivityQueue::default(),
            dead: false,
            paused: false,
        };
        self.actors.insert(id, actor);
        debug!(actor = %id, actor_type = %init.actor_type, owner = %init.owner, position = %init.position, "actor spawned");
        Ok(id)
    }

    /// A live actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id).filter(|actor| !actor.dead)
    }

    /// A live actor, mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id).filter(|actor| !actor.dead)
    }

    /// Whether `id` names a live actor.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actor(id).is_some()
    }

    /// Live actors in creation order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(|actor| !actor.dead)
    }

    /// Ids of live actors in creation order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.actors().map(Actor::id).collect()
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.actors().count()
    }

    /// Whether no actor is alive.
    pub fn is_empty(&self) -> bool {
        self.actors().next().is_none()
    }

    /// The id the next spawned actor will get.
    pub const fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Mark an actor dead. Returns `false` if it was not alive.
    pub fn kill(&mut self, id: ActorId) -> bool {
        self.actor_mut(id).map(Actor::mark_dead).is_some()
    }

    /// Suspend or resume an actor's activity advancement.
    /// Returns `false` if it was not alive.
    pub fn set_paused(&mut self, id: ActorId, paused: bool) -> bool {
        self.actor_mut(id).map(|actor| actor.paused = paused).is_some()
    }

    /// Drop every dead actor and return their ids in creation order.
    pub fn remove_dead(&mut self) -> Vec<ActorId> {
        let dead: Vec<ActorId> = self
            .actors
            .values()
            .filter(|actor| actor.dead)
            .map(Actor::id)
            .collect();
        for id in &dead {
            self.actors.remove(id);
        }
        dead
    }

    /// Run `f` with the live actor `id` taken out of the world.
    ///
    /// `f` gets the actor mutably and the rest of the world immutably.
    /// Returns `None` without calling `f` if the actor is not alive.
    pub fn with_detached<R>(&mut self, id: ActorId, f: impl FnOnce(&mut Actor, &Self) -> R) -> Option<R> {
        let mut actor = self.actors.remove(&id)?;
        if actor.dead {
            self.actors.insert(id, actor);
            return None;
        }
        let result = f(&mut actor, self);
        self.actors.insert(id, actor);
        Some(result)
    }

    /// Complete records of every actor in creation order, including actors
    /// destroyed this tick that the sweep has not removed yet.
    pub fn records(&self) -> Vec<ActorRecord> {
        self.actors.values().map(Actor::record).collect()
    }

    /// Rebuild a world from records.
    ///
    /// Trait sets come from the registry; each record must supply a state of
    /// the right kind for every declared key, and nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a type is unknown, an id repeats, or a
    /// record's traits do not match the rules.
    pub fn restore(
        registry: &TraitRegistry,
        next_id: u32,
        records: &[ActorRecord],
    ) -> Result<Self, WorldError> {
        let mut world = Self {
            actors: BTreeMap::new(),
            next_id,
        };
        for record in records {
            let actor = restore_actor(registry, record)?;
            if world.actors.contains_key(&record.id) {
                return Err(WorldError::DuplicateActor(record.id));
            }
            let after = record
                .id
                .into_inner()
                .checked_add(1)
                .ok_or(WorldError::IdSpaceExhausted)?;
            world.next_id = world.next_id.max(after);
            world.actors.insert(record.id, actor);
        }
        Ok(world)
    }

    /// Read-only view of every live actor.
    pub fn snapshot(&self, tick: u64) -> WorldSnapshot {
        WorldSnapshot {
            tick,
            actors: self.actors().map(Actor::snapshot).collect(),
        }
    }
}

fn restore_actor(registry: &TraitRegistry, record: &ActorRecord) -> Result<Actor, WorldError> {
    let mismatch = |reason: String| WorldError::RecordMismatch {
        actor: record.id,
        actor_type: record.actor_type.clone(),
        reason,
    };

    let mut traits = registry.create(&record.actor_type)?;
    if record.traits.len() != traits.len() {
        return Err(mismatch(format!(
            "{} trait states recorded, {} declared",
            record.traits.len(),
            traits.len()
        )));
    }
    for trait_record in &record.traits {
        let instance = traits
            .instance_mut(&trait_record.key)
            .ok_or_else(|| mismatch(format!("`{}` is not declared", trait_record.key)))?;
        if !instance.replace_state(trait_record.state.clone()) {
            return Err(mismatch(format!(
                "`{}` recorded with `{}` state",
                trait_record.key,
                trait_record.state.kind()
            )));
        }
    }

    Ok(Actor {
        id: record.id,
        owner: record.owner,
        actor_type: record.actor_type.clone(),
        position: record.position,
        facing: record.facing,
        traits,
        activities: ActivityQueue::from_nodes(record.activities.iter().cloned()),
        dead: record.dead,
        paused: record.paused,
    })
}
