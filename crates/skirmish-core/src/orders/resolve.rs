//! Authoritative order resolution.
//!
//! Resolution never fails. A missing source, a missing target, or a verb
//! nobody handles is a no-op reported through [`ResolveOutcome`] and logged
//! at debug level; none of them desynchronizes the match because every
//! participant reaches the same verdict.

use skirmish_types::{ActorId, Order, PlayerId, WorldPos};
use tracing::debug;

use crate::activity::{Activity, ActivityQueue};
use crate::rng::SyncRng;
use crate::world::World;

/// What resolving one order did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The order was offered to this many traits.
    Applied {
        /// Number of traits whose verb set matched.
        traits: usize,
    },
    /// The source actor is dead or never existed.
    SourceMissing,
    /// The submitting player does not own the source actor.
    NotOwner,
    /// No trait on the source resolves the verb.
    CapabilityMismatch,
}

impl ResolveOutcome {
    /// Whether any trait saw the order.
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// What a resolve-capable trait sees besides its own state.
pub struct ResolveContext<'a> {
    /// The order being resolved.
    pub order: &'a Order,
    /// Every other actor, read-only.
    pub world: &'a World,
    /// The tick's synced random stream.
    pub rng: &'a mut SyncRng,
    /// The tick being simulated.
    pub tick: u64,
}

/// The writable parts of the order's source actor.
pub struct OrderSubject<'a> {
    id: ActorId,
    owner: PlayerId,
    position: WorldPos,
    activities: &'a mut ActivityQueue,
    dead: &'a mut bool,
}

impl<'a> OrderSubject<'a> {
    pub(crate) const fn new(
        id: ActorId,
        owner: PlayerId,
        position: WorldPos,
        activities: &'a mut ActivityQueue,
        dead: &'a mut bool,
    ) -> Self {
        Self {
            id,
            owner,
            position,
            activities,
            dead,
        }
    }

    /// The source actor.
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// The source actor's owner.
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// The source actor's cell.
    pub const fn position(&self) -> WorldPos {
        self.position
    }

    /// Whether an earlier trait destroyed the source during this resolution.
    pub const fn is_dead(&self) -> bool {
        *self.dead
    }

    /// The source's activity queue.
    pub fn activities(&self) -> &ActivityQueue {
        &*self.activities
    }

    /// Discard the source's activities. Always before queueing new ones.
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

    /// Destroy the source. The sweep at the end of the tick removes it.
    pub fn kill(&mut self) {
        *self.dead = true;
        self.activities.cancel();
    }
}

/// Resolve `order`, submitted by `player`, against the world.
///
/// Every resolve-capable trait on the source whose verb set contains the
/// order's verb is invoked, in declaration order.
pub fn resolve_order(
    world: &mut World,
    player: PlayerId,
    order: &Order,
    rng: &mut SyncRng,
    tick: u64,
) -> ResolveOutcome {
    let source = order.source();
    let outcome = world.with_detached(source, |actor, world| {
        if actor.owner() != player {
            return ResolveOutcome::NotOwner;
        }
        let mut ctx = ResolveContext {
            order,
            world,
            rng,
            tick,
        };
        match actor.resolve_order(&mut ctx) {
            0 => ResolveOutcome::CapabilityMismatch,
            traits => ResolveOutcome::Applied { traits },
        }
    });

    let outcome = outcome.unwrap_or(ResolveOutcome::SourceMissing);
    if !outcome.is_applied() {
        debug!(tick, %player, actor = %source, verb = order.verb(), ?outcome, "order had no effect");
    }
    outcome
}
