//! The per-actor activity queue.

use std::collections::VecDeque;

use skirmish_types::ActivityKind;

use crate::activity::{Activity, ActivityContext, ActivityStep};
use crate::world::Actor;

/// An actor's queued activities. The head is the current activity; an empty
/// queue means the actor is idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQueue {
    nodes: VecDeque<Activity>,
    cancel_requested: bool,
}

impl ActivityQueue {
    pub(crate) fn from_nodes(nodes: impl IntoIterator<Item = Activity>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            cancel_requested: false,
        }
    }

    /// Whether nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of queued activities, including the current one.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The current activity.
    pub fn current(&self) -> Option<&Activity> {
        self.nodes.front()
    }

    /// The current activity's kind.
    pub fn current_kind(&self) -> Option<ActivityKind> {
        self.current().map(Activity::kind)
    }

    /// Queued activities, current first.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.nodes.iter()
    }

    /// Discard every queued activity.
    ///
    /// A cancel issued from inside a running step is latched and also
    /// discards whatever the step leaves behind.
    pub fn cancel(&mut self) {
        self.nodes.clear();
        self.cancel_requested = true;
    }

    /// Append an activity at the back.
    pub fn queue(&mut self, activity: Activity) {
        self.nodes.push_back(activity);
    }

    /// Put an activity ahead of the current one.
    pub fn queue_front(&mut self, activity: Activity) {
        self.nodes.push_front(activity);
    }

    pub(crate) const fn clear_cancel_latch(&mut self) {
        self.cancel_requested = false;
    }

    /// Run one step of the current activity and apply its result.
    ///
    /// Returns the kind of the activity that ran, or `None` when idle.
    pub(crate) fn advance(
        &mut self,
        actor: &mut Actor,
        ctx: &mut ActivityContext<'_>,
    ) -> Option<ActivityKind> {
        let current = self.nodes.front_mut()?;
        let kind = current.kind();
        match current.tick(actor, ctx) {
            ActivityStep::Continue => {}
            ActivityStep::Complete => {
                self.nodes.pop_front();
            }
            ActivityStep::Replace(next) => {
                self.nodes.pop_front();
                self.push_front_all(next);
            }
            ActivityStep::QueueChildFirst(children) => self.push_front_all(children),
        }
        Some(kind)
    }

    /// Fold in what happened to the actor's queue while a step was running.
    pub(crate) fn absorb(&mut self, during_step: Self) {
        if during_step.cancel_requested {
            self.nodes.clear();
        }
        self.nodes.extend(during_step.nodes);
    }

    fn push_front_all(&mut self, nodes: Vec<Activity>) {
        for node in nodes.into_iter().rev() {
            self.nodes.push_front(node);
        }
    }
}
