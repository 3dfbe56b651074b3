//! Movement, waiting and callbacks.

use serde::{Deserialize, Serialize};
use skirmish_types::{Facing, WorldPos};

use crate::activity::{Activity, ActivityContext, ActivityStep};
use crate::traits::{Mobile, RallyPoint};
use crate::world::{Actor, ActorInit, SpawnRequest};

/// Travel to a cell at the actor's `Mobile` speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTo {
    target: WorldPos,
}

impl MoveTo {
    /// Travel to `target`.
    pub const fn new(target: WorldPos) -> Self {
        Self { target }
    }

    /// The destination.
    pub const fn target(&self) -> WorldPos {
        self.target
    }

    pub(crate) fn tick(&self, actor: &mut Actor, ctx: &ActivityContext<'_>) -> ActivityStep {
        // Immobile actors cannot travel; the move is over before it starts.
        let Some(speed) = actor.traits().get::<Mobile>().map(|mobile| mobile.info().speed) else {
            return ActivityStep::Complete;
        };
        let from = actor.position();
        if from == self.target {
            return ActivityStep::Complete;
        }

        let next = ctx.locomotor.step(from, self.target, speed);
        if let Some(facing) = Facing::toward(from, next) {
            actor.set_facing(facing);
        }
        actor.set_position(next);

        if next == self.target {
            ActivityStep::Complete
        } else {
            ActivityStep::Continue
        }
    }
}

/// Do nothing for a number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wait {
    remaining: u32,
}

impl Wait {
    /// Wait `ticks` ticks. A zero-tick wait completes on its first step.
    pub const fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Ticks left.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) const fn tick(&mut self) -> ActivityStep {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            ActivityStep::Complete
        } else {
            ActivityStep::Continue
        }
    }
}

/// A one-shot callback queued behind other activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callback {
    /// Replace the callback with a move to the given cell.
    QueueMove(WorldPos),
    /// Destroy the actor.
    Die,
    /// Finish building an actor of this type on the actor's cell.
    Produce(String),
}

impl Callback {
    pub(crate) fn run(&self, actor: &mut Actor, ctx: &mut ActivityContext<'_>) -> ActivityStep {
        match self {
            Self::QueueMove(target) => ActivityStep::Replace(vec![Activity::move_to(*target)]),
            Self::Produce(actor_type) => {
                let rally = actor
                    .traits()
                    .get::<RallyPoint>()
                    .and_then(|rally| rally.state().location());
                ctx.spawns.push(SpawnRequest {
                    producer: actor.id(),
                    init: ActorInit {
                        actor_type: actor_type.clone(),
                        owner: actor.owner(),
                        position: actor.position(),
                        facing: actor.facing(),
                        hp: None,
                    },
                    rally,
                });
                ActivityStep::Complete
            }
            Self::Die => {
                actor.cancel_activity();
                actor.mark_dead();
                ActivityStep::Complete
            }
        }
    }
}
