//! Activities: the time-extended steps of actor behavior.
//!
//! Resolving an order changes what an actor *intends*; activities are how
//! that intent plays out over ticks. Each actor owns an [`ActivityQueue`]
//! whose head is the current activity. Once per tick the head runs exactly
//! one step and reports an [`ActivityStep`] telling the queue what to do
//! next. Activities are plain serializable data so an in-flight queue can be
//! hashed, saved and restored.
//!
//! # Modules
//!
//! - [`queue`] -- The per-actor queue and its advancement rules
//! - [`movement`] -- `MoveTo`, `Wait`, and `CallFunc` callbacks (including
//!   production)
//! - [`service`] -- `Rearm` and `Repair` at a repair bay

pub mod movement;
pub mod queue;
pub mod service;

use serde::{Deserialize, Serialize};
use skirmish_types::{ActivityKind, ActorId, WorldPos};

use crate::locomotor::Locomotor;
use crate::rng::SyncRng;
use crate::world::{Actor, SpawnRequest, World};

pub use movement::{Callback, MoveTo, Wait};
pub use queue::ActivityQueue;
pub use service::{Rearm, Repair};

/// What the queue should do after the current activity ran one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityStep {
    /// Stay current; more work remains.
    Continue,
    /// Pop the current activity and promote the next one.
    Complete,
    /// Pop the current activity and put these in its place, in order.
    Replace(Vec<Activity>),
    /// Run these first, then resume the current activity.
    QueueChildFirst(Vec<Activity>),
}

/// Everything an activity step may read besides its own actor.
pub struct ActivityContext<'a> {
    /// Every other actor, read-only. The advancing actor is not in here.
    pub world: &'a World,
    /// The movement seam.
    pub locomotor: &'a dyn Locomotor,
    /// The tick's synced random stream.
    pub rng: &'a mut SyncRng,
    /// Actors to create once every actor has advanced.
    pub spawns: &'a mut Vec<SpawnRequest>,
    /// The tick being simulated.
    pub tick: u64,
}

/// One node of an actor's activity queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    /// Travel to a cell.
    MoveTo(MoveTo),
    /// Reload ammunition at a repair bay.
    Rearm(Rearm),
    /// Restore hit points at a repair bay.
    Repair(Repair),
    /// Do nothing for a number of ticks.
    Wait(Wait),
    /// Run a callback once.
    CallFunc(Callback),
}

impl Activity {
    /// Travel to `target`.
    pub const fn move_to(target: WorldPos) -> Self {
        Self::MoveTo(MoveTo::new(target))
    }

    /// Rearm at `bay`.
    pub const fn rearm(bay: ActorId) -> Self {
        Self::Rearm(Rearm::new(bay))
    }

    /// Repair at `bay`.
    pub const fn repair(bay: ActorId) -> Self {
        Self::Repair(Repair::new(bay))
    }

    /// Wait `ticks` ticks.
    pub const fn wait(ticks: u32) -> Self {
        Self::Wait(Wait::new(ticks))
    }

    /// Run `callback` once.
    pub const fn call(callback: Callback) -> Self {
        Self::CallFunc(callback)
    }

    /// The kind reported to renderers for animation selection.
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::MoveTo(_) => ActivityKind::Move,
            Self::Rearm(_) => ActivityKind::Rearm,
            Self::Repair(_) => ActivityKind::Repair,
            Self::Wait(_) => ActivityKind::Wait,
            Self::CallFunc(_) => ActivityKind::Callback,
        }
    }

    pub(crate) fn tick(&mut self, actor: &mut Actor, ctx: &mut ActivityContext<'_>) -> ActivityStep {
        match self {
            Self::MoveTo(activity) => activity.tick(actor, ctx),
            Self::Rearm(activity) => activity.tick(actor, ctx),
            Self::Repair(activity) => activity.tick(actor, ctx),
            Self::Wait(activity) => activity.tick(),
            Self::CallFunc(callback) => callback.run(actor, ctx),
        }
    }
}
