//! `RallyPoint`: where units produced or repaired at a building head next.

use serde::{Deserialize, Serialize};
use skirmish_types::{Order, WorldPos, verbs};

use crate::orders::{IssueContext, MouseButton, ResolveContext};

/// Configuration for [`RallyPoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RallyPointInfo {
    /// Initial rally point relative to the building's cell. `None` starts unset.
    pub offset: Option<WorldPos>,
}

/// The building's current rally point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyPoint {
    location: Option<WorldPos>,
}

impl RallyPoint {
    /// The current rally point, if one is set.
    pub const fn location(&self) -> Option<WorldPos> {
        self.location
    }

    /// Place the initial rally point for a building spawned at `position`.
    pub(crate) fn place(&mut self, info: &RallyPointInfo, position: WorldPos) {
        self.location = info.offset.map(|offset| {
            WorldPos::new(
                position.x.saturating_add(offset.x),
                position.y.saturating_add(offset.y),
            )
        });
    }

    pub(crate) const fn resolve_order(&mut self, ctx: &ResolveContext<'_>) {
        if let Some(location) = ctx.order.target_location() {
            self.location = Some(location);
        }
    }
}

pub(crate) fn resolves(verb: &str) -> bool {
    verb == verbs::SET_RALLY_POINT
}

/// Right-click on open ground with the building selected.
pub(crate) fn issue_order(_info: &RallyPointInfo, ctx: &IssueContext<'_>) -> Option<Order> {
    if ctx.input.button != MouseButton::Right || ctx.target.is_some() {
        return None;
    }
    if ctx.input.player != ctx.actor.owner() {
        return None;
    }
    let location = ctx.location?;
    Some(Order::new(ctx.actor.id(), verbs::SET_RALLY_POINT).with_target_location(location))
}
