//! `Production`: buildings that build new actors on `Produce`.
//!
//! The order names the actor type in its string payload. Each accepted order
//! appends a build timer and a [`Callback::Produce`] to the building's queue,
//! so several orders form a production queue worked through one at a time.
//! The finished actor appears on the building's cell once every actor has
//! advanced, and heads for the building's rally point if one is set.

use serde::{Deserialize, Serialize};
use skirmish_types::verbs;
use tracing::debug;

use crate::activity::{Activity, Callback};
use crate::orders::{OrderSubject, ResolveContext};

/// Configuration for [`Production`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionInfo {
    /// Actor types this building can build.
    pub produces: Vec<String>,
    /// Ticks one build takes.
    pub build_ticks: u32,
}

impl Default for ProductionInfo {
    fn default() -> Self {
        Self {
            produces: Vec::new(),
            build_ticks: 10,
        }
    }
}

impl ProductionInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.produces.is_empty() {
            return Err("produces must list at least one actor type".to_owned());
        }
        if self.build_ticks == 0 {
            return Err("build_ticks must be at least 1".to_owned());
        }
        Ok(())
    }

    fn can_build(&self, actor_type: &str) -> bool {
        self.produces.iter().any(|name| name == actor_type)
    }
}

/// Stateless marker for buildings that produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production;

pub(crate) fn resolves(verb: &str) -> bool {
    verb == verbs::PRODUCE
}

/// Queue one build behind whatever the building is already doing.
pub(crate) fn resolve_order(
    info: &ProductionInfo,
    subject: &mut OrderSubject<'_>,
    ctx: &ResolveContext<'_>,
) {
    let Some(actor_type) = ctx.order.target_string() else {
        debug!(actor = %subject.id(), "produce order without an actor type ignored");
        return;
    };
    if !info.can_build(actor_type) {
        debug!(actor = %subject.id(), actor_type, "building cannot produce this type");
        return;
    }
    subject.queue_activity(Activity::wait(info.build_ticks));
    subject.queue_activity(Activity::call(Callback::Produce(actor_type.to_owned())));
}
