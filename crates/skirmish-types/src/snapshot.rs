//! Read-only world snapshots for renderer and UI consumers.
//!
//! Snapshots are taken between ticks only. They expose what a presentation
//! layer needs -- position, owner, the current activity kind for animation
//! selection, and the display state that traits choose to publish -- and
//! nothing that would let a consumer mutate the simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geometry::{Facing, WorldPos};
use crate::ids::{ActorId, PlayerId};

/// The kind of activity an actor is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActivityKind {
    /// Travelling towards a cell.
    Move,
    /// Reloading ammunition at a repair bay.
    Rearm,
    /// Being repaired at a repair bay.
    Repair,
    /// Waiting for a number of ticks.
    Wait,
    /// Running a one-shot callback.
    Callback,
}

/// Health display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthView {
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
}

/// Ammunition display state for one ammo pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AmmoView {
    /// The pool's qualifier, if it has one.
    pub qualifier: Option<String>,
    /// Rounds currently loaded.
    pub ammo: u32,
    /// Pool capacity.
    pub capacity: u32,
}

/// Everything a renderer may know about one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActorSnapshot {
    /// The actor's identity.
    pub id: ActorId,
    /// The owning player.
    pub owner: PlayerId,
    /// The actor type name from the rules.
    pub actor_type: String,
    /// Current cell.
    pub position: WorldPos,
    /// Current facing.
    pub facing: Facing,
    /// Kind of the current activity, `None` when idle.
    pub activity: Option<ActivityKind>,
    /// Number of queued activities including the current one.
    pub queued_activities: u32,
    /// Health, for actors with a `Health` trait.
    pub health: Option<HealthView>,
    /// Ammunition, one entry per `AmmoPool` in declaration order.
    pub ammo: Vec<AmmoView>,
    /// Rally point, for actors with a `RallyPoint` trait that has one set.
    pub rally_point: Option<WorldPos>,
    /// Keys (`Highlight@LIGHTS`) of the highlight traits currently flashing.
    pub highlights: Vec<String>,
}

/// All live actors after a completed tick, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// The number of completed ticks.
    pub tick: u64,
    /// Live actors in creation order.
    pub actors: Vec<ActorSnapshot>,
}

impl WorldSnapshot {
    /// Find an actor's snapshot by id.
    pub fn actor(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .and_then(|idx| self.actors.get(idx))
    }
}
