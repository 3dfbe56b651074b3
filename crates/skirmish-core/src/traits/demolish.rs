//! `Demolishable`: self-destruct after a (jittered) delay.

use serde::{Deserialize, Serialize};
use skirmish_types::verbs;
use tracing::debug;

use crate::activity::{Activity, Callback};
use crate::orders::{OrderSubject, ResolveContext};

/// Configuration for [`Demolishable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemolishableInfo {
    /// Fixed ticks before destruction. Zero with no jitter destroys at once.
    pub delay_ticks: u32,
    /// Up to this many extra ticks, drawn from the synced random stream.
    pub jitter_ticks: u32,
}

/// Whether a demolition is already under way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demolishable {
    primed: bool,
}

impl Demolishable {
    /// Whether the charge is set.
    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    pub(crate) fn resolve_order(
        &mut self,
        info: &DemolishableInfo,
        subject: &mut OrderSubject<'_>,
        ctx: &mut ResolveContext<'_>,
    ) {
        if self.primed {
            debug!(actor = %subject.id(), "already demolishing");
            return;
        }
        self.primed = true;

        let jitter = ctx.rng.up_to(info.jitter_ticks);
        let delay = info.delay_ticks.saturating_add(jitter);
        if delay == 0 {
            subject.kill();
            return;
        }
        subject.cancel_activity();
        subject.queue_activity(Activity::wait(delay));
        subject.queue_activity(Activity::call(Callback::Die));
    }
}

pub(crate) fn resolves(verb: &str) -> bool {
    verb == verbs::DEMOLISH
}
