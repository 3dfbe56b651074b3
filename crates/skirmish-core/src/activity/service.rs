//! Rearming and repairing at a repair bay.
//!
//! Both activities read the bay through the world, read-only, and write only
//! the servicing actor. A bay that dies mid-service ends the activity.

use serde::{Deserialize, Serialize};
use skirmish_types::ActorId;

use crate::activity::{Activity, ActivityContext, ActivityStep};
use crate::traits::{AmmoPool, Health, RepairBay};
use crate::world::Actor;

/// Reload every `AmmoPool` at a bay, each at its own `reload_ticks` rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rearm {
    bay: ActorId,
    elapsed: u32,
}

impl Rearm {
    /// Rearm at `bay`.
    pub const fn new(bay: ActorId) -> Self {
        Self { bay, elapsed: 0 }
    }

    /// The servicing bay.
    pub const fn bay(&self) -> ActorId {
        self.bay
    }

    pub(crate) fn tick(&mut self, actor: &mut Actor, ctx: &ActivityContext<'_>) -> ActivityStep {
        let Some(bay) = ctx.world.actor(self.bay) else {
            return ActivityStep::Complete;
        };
        if !needs_ammo(actor) {
            return ActivityStep::Complete;
        }
        if actor.position() != bay.position() {
            return ActivityStep::QueueChildFirst(vec![Activity::move_to(bay.position())]);
        }

        self.elapsed = self.elapsed.saturating_add(1);
        let elapsed = self.elapsed;
        for mut pool in actor.traits_mut().all_mut::<AmmoPool>() {
            let info = pool.info();
            if !pool.state().is_full(info) && elapsed.checked_rem(info.reload_ticks) == Some(0) {
                pool.state_mut().reload_one(info);
            }
        }

        if needs_ammo(actor) {
            ActivityStep::Continue
        } else {
            ActivityStep::Complete
        }
    }
}

fn needs_ammo(actor: &Actor) -> bool {
    actor
        .traits()
        .all::<AmmoPool>()
        .any(|pool| !pool.state().is_full(pool.info()))
}

/// Restore hit points at a bay, at the bay's configured rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repair {
    bay: ActorId,
    elapsed: u32,
}

impl Repair {
    /// Repair at `bay`.
    pub const fn new(bay: ActorId) -> Self {
        Self { bay, elapsed: 0 }
    }

    /// The servicing bay.
    pub const fn bay(&self) -> ActorId {
        self.bay
    }

    pub(crate) fn tick(&mut self, actor: &mut Actor, ctx: &ActivityContext<'_>) -> ActivityStep {
        let Some(bay) = ctx.world.actor(self.bay) else {
            return ActivityStep::Complete;
        };
        let Some(bay_info) = bay.traits().get::<RepairBay>().map(|rb| rb.info()) else {
            return ActivityStep::Complete;
        };
        let damaged = actor
            .traits()
            .get::<Health>()
            .is_some_and(|health| !health.state().is_full(health.info()));
        if !damaged {
            return ActivityStep::Complete;
        }
        if actor.position() != bay.position() {
            return ActivityStep::QueueChildFirst(vec![Activity::move_to(bay.position())]);
        }

        self.elapsed = self.elapsed.saturating_add(1);
        let Some(mut health) = actor.traits_mut().get_mut::<Health>() else {
            return ActivityStep::Complete;
        };
        let info = health.info();
        if self.elapsed.checked_rem(bay_info.interval_ticks) == Some(0) {
            health.state_mut().heal(info, bay_info.hp_per_step);
        }

        if health.state().is_full(info) {
            ActivityStep::Complete
        } else {
            ActivityStep::Continue
        }
    }
}
