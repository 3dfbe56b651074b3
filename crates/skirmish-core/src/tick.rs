//! Tick cycle: the fixed-order loop that advances a [`Simulation`] by one tick.
//!
//! Each tick runs these phases, identically on every participant:
//!
//! 1. **Resolution** -- resolve every order in the tick's [`OrderBatch`], by
//!    ascending player id and then submission order.
//! 2. **Advancement** -- for every live actor in creation order, run one step
//!    of its current activity, then its tick-capable traits.
//! 3. **Production** -- create the actors requested during advancement, in
//!    the order they were requested, and send each to its producer's rally
//!    point. New actors first advance on the next tick.
//! 4. **Sweep** -- remove actors destroyed during this tick.
//! 5. **Record** -- append the batch to the order history, advance the tick
//!    counter and, on hash ticks, compute the state hash.
//!
//! All randomness comes from one [`SyncRng`] stream derived from the session
//! seed and the tick number. Nothing reads the wall clock.

use std::sync::Arc;

use skirmish_types::{ActorId, OrderBatch, WorldSnapshot};
use tracing::{debug, info};

use crate::activity::{Activity, ActivityContext};
use crate::locomotor::{Locomotor, StraightLine};
use crate::orders::resolve_order;
use crate::rng::SyncRng;
use crate::sync::state_hash;
use crate::traits::{Mobile, TraitRegistry};
use crate::world::{ActorInit, SpawnRequest, World, WorldError};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The batch is not for the tick about to run.
    #[error("order batch for tick {received} offered while tick {expected} is pending")]
    BatchOutOfSequence {
        /// The tick about to run.
        expected: u64,
        /// The tick the batch was built for.
        received: u64,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow")]
    TickOverflow,

    /// Initial spawns are only accepted before the first tick.
    #[error("cannot add map actors after tick {tick} has run")]
    MapLocked {
        /// Ticks already completed.
        tick: u64,
    },

    /// An entity store operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The state could not be encoded for hashing.
    #[error("state hash encoding failed: {source}")]
    Hash {
        /// The underlying encoding error.
        #[from]
        source: serde_json::Error,
    },
}

/// Summary of one completed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that ran.
    pub tick: u64,
    /// Orders in the batch.
    pub orders: u32,
    /// Orders that reached at least one trait.
    pub applied: u32,
    /// Orders that were no-ops.
    pub ignored: u32,
    /// Actors whose current activity ran a step.
    pub advanced: u32,
    /// Actors produced this tick, in creation order.
    pub spawned: Vec<ActorId>,
    /// Actors swept at the end of the tick, in creation order.
    pub removed: Vec<ActorId>,
    /// Live actors after the sweep.
    pub actors_alive: u32,
    /// State hash after the tick, on hash ticks.
    pub state_hash: Option<String>,
}

/// One participant's copy of the match.
#[derive(Debug)]
pub struct Simulation {
    registry: Arc<TraitRegistry>,
    locomotor: Box<dyn Locomotor>,
    world: World,
    seed: u64,
    tick: u64,
    hash_interval: u64,
    map: Vec<ActorInit>,
    history: Vec<OrderBatch>,
}

impl Simulation {
    /// A fresh match at tick 0 with an empty world.
    ///
    /// Hashes every tick and moves in straight lines until configured
    /// otherwise.
    pub fn new(registry: Arc<TraitRegistry>, seed: u64) -> Self {
        Self {
            registry,
            locomotor: Box::new(StraightLine),
            world: World::new(),
            seed,
            tick: 0,
            hash_interval: 1,
            map: Vec::new(),
            history: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        registry: Arc<TraitRegistry>,
        seed: u64,
        tick: u64,
        world: World,
        map: Vec<ActorInit>,
        history: Vec<OrderBatch>,
    ) -> Self {
        Self {
            world,
            tick,
            map,
            history,
            ..Self::new(registry, seed)
        }
    }

    /// Plug in a different movement implementation.
    #[must_use]
    pub fn with_locomotor(mut self, locomotor: Box<dyn Locomotor>) -> Self {
        self.locomotor = locomotor;
        self
    }

    /// Hash every `interval` ticks; zero disables hashing.
    #[must_use]
    pub const fn with_hash_interval(mut self, interval: u64) -> Self {
        self.hash_interval = interval;
        self
    }

    /// Place an initial actor. Only allowed before the first tick; actors
    /// created later come from production during the tick cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::MapLocked`] once a tick has run, or
    /// [`TickError::World`] if the actor cannot be created.
    pub fn spawn(&mut self, init: ActorInit) -> Result<ActorId, TickError> {
        if self.tick > 0 {
            return Err(TickError::MapLocked { tick: self.tick });
        }
        let id = self.world.spawn(&self.registry, &init)?;
        self.map.push(init);
        Ok(id)
    }

    /// The rules this match runs on.
    pub const fn registry(&self) -> &Arc<TraitRegistry> {
        &self.registry
    }

    /// The entity store.
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The entity store, mutably.
    ///
    /// Changes made here bypass the order protocol: they are not recorded in
    /// the history and replays will not reproduce them.
    pub const fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The session seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Completed ticks; also the number of the tick about to run.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The initial spawns, in spawn order.
    pub fn map(&self) -> &[ActorInit] {
        &self.map
    }

    /// Every batch run so far, in tick order.
    pub fn history(&self) -> &[OrderBatch] {
        &self.history
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot(self.tick)
    }

    /// The current state hash.
    ///
    /// # Errors
    ///
    /// Returns the encoding error if the state cannot be serialized.
    pub fn state_hash(&self) -> Result<String, serde_json::Error> {
        state_hash(&self.world, self.tick)
    }

    /// Run the pending tick with `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::BatchOutOfSequence`] if `batch` is for another
    /// tick, [`TickError::TickOverflow`] at the end of time,
    /// [`TickError::World`] if a produced actor cannot be created, or
    /// [`TickError::Hash`] if hashing fails. A rejected batch leaves the
    /// simulation untouched.
    pub fn run_tick(&mut self, batch: &OrderBatch) -> Result<TickSummary, TickError> {
        let tick = self.tick;
        if batch.tick != tick {
            return Err(TickError::BatchOutOfSequence {
                expected: tick,
                received: batch.tick,
            });
        }
        let next_tick = tick.checked_add(1).ok_or(TickError::TickOverflow)?;
        let mut rng = SyncRng::for_tick(self.seed, tick);

        // --- Phase 1: Resolution ---
        let mut orders: u32 = 0;
        let mut applied: u32 = 0;
        for (player, order) in batch.iter() {
            orders = orders.saturating_add(1);
            if resolve_order(&mut self.world, player, order, &mut rng, tick).is_applied() {
                applied = applied.saturating_add(1);
            }
        }

        // --- Phase 2: Advancement ---
        let mut advanced: u32 = 0;
        let mut requests: Vec<SpawnRequest> = Vec::new();
        let locomotor = &*self.locomotor;
        for id in self.world.ids() {
            self.world.with_detached(id, |actor, world| {
                let mut ctx = ActivityContext {
                    world,
                    locomotor,
                    rng: &mut rng,
                    spawns: &mut requests,
                    tick,
                };
                if actor.advance_activity(&mut ctx).is_some() {
                    advanced = advanced.saturating_add(1);
                }
                if !actor.is_dead() {
                    actor.tick_traits();
                }
            });
        }

        // --- Phase 3: Production ---
        let spawned = self.produce(tick, requests)?;

        // --- Phase 4: Sweep ---
        let removed = self.world.remove_dead();
        for id in &removed {
            debug!(tick, actor = %id, "actor removed");
        }

        // --- Phase 5: Record ---
        self.history.push(batch.clone());
        self.tick = next_tick;
        let hash = if self.hash_interval > 0 && next_tick.checked_rem(self.hash_interval) == Some(0) {
            Some(state_hash(&self.world, next_tick)?)
        } else {
            None
        };

        let actors_alive = u32::try_from(self.world.len()).unwrap_or(u32::MAX);
        info!(
            tick,
            orders,
            applied,
            advanced,
            spawned = spawned.len(),
            removed = removed.len(),
            actors_alive,
            hash = hash.as_deref().unwrap_or("-"),
            "Tick completed"
        );

        Ok(TickSummary {
            tick,
            orders,
            applied,
            ignored: orders.saturating_sub(applied),
            advanced,
            spawned,
            removed,
            actors_alive,
            state_hash: hash,
        })
    }

    fn produce(
        &mut self,
        tick: u64,
        requests: Vec<SpawnRequest>,
    ) -> Result<Vec<ActorId>, TickError> {
        let mut spawned = Vec::with_capacity(requests.len());
        for request in requests {
            let id = self.world.spawn(&self.registry, &request.init)?;
            let mobile = self
                .world
                .actor(id)
                .is_some_and(|actor| actor.traits().has::<Mobile>());
            let heading = request.rally.filter(|_| mobile);
            if let (Some(rally), Some(actor)) = (heading, self.world.actor_mut(id)) {
                actor.queue_activity(Activity::move_to(rally));
            }
            debug!(tick, actor = %id, producer = %request.producer, actor_type = %request.init.actor_type, "actor produced");
            spawned.push(id);
        }
        Ok(spawned)
    }
}
