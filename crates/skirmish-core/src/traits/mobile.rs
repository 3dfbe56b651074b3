//! `Mobile`: ground movement.

use serde::{Deserialize, Serialize};
use skirmish_types::{Order, verbs};
use tracing::debug;

use crate::activity::Activity;
use crate::orders::{IssueContext, MouseButton, OrderSubject, ResolveContext};

/// Configuration for [`Mobile`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MobileInfo {
    /// Cells per tick.
    pub speed: u32,
}

impl Default for MobileInfo {
    fn default() -> Self {
        Self { speed: 1 }
    }
}

impl MobileInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.speed == 0 {
            return Err("speed must be at least 1".to_owned());
        }
        Ok(())
    }
}

/// Movement carries no per-actor state; position lives on the actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mobile;

pub(crate) fn resolves(verb: &str) -> bool {
    verb == verbs::MOVE || verb == verbs::STOP
}

/// Right-click on open ground by the owner.
pub(crate) fn issue_order(_info: &MobileInfo, ctx: &IssueContext<'_>) -> Option<Order> {
    if ctx.input.button != MouseButton::Right || ctx.target.is_some() {
        return None;
    }
    if ctx.input.player != ctx.actor.owner() {
        return None;
    }
    let location = ctx.location?;
    Some(
        Order::new(ctx.actor.id(), verbs::MOVE)
            .with_target_location(location)
            .with_queued(ctx.input.modifiers.shift),
    )
}

pub(crate) fn resolve_order(
    _info: &MobileInfo,
    subject: &mut OrderSubject<'_>,
    ctx: &ResolveContext<'_>,
) {
    let order = ctx.order;
    if order.verb() == verbs::STOP {
        subject.cancel_activity();
        return;
    }
    let Some(target) = order.target_location() else {
        debug!(actor = %subject.id(), "move order without a location ignored");
        return;
    };
    if !order.is_queued() {
        subject.cancel_activity();
    }
    subject.queue_activity(Activity::move_to(target));
}
