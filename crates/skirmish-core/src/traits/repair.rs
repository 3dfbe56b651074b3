//! Repair: `SeeksRepair` on units, `RepairBay` on the buildings that serve them.

use serde::{Deserialize, Serialize};
use skirmish_types::{Order, verbs};
use tracing::debug;

use crate::activity::{Activity, Callback};
use crate::orders::{IssueContext, MouseButton, OrderSubject, ResolveContext};
use crate::traits::RallyPoint;
use crate::world::Actor;

/// Configuration for [`SeeksRepair`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeeksRepairInfo {
    /// Actor types this unit may enter for repairs. Each must carry `RepairBay`.
    pub repair_buildings: Vec<String>,
}

impl SeeksRepairInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.repair_buildings.is_empty() {
            return Err("repair_buildings must list at least one actor type".to_owned());
        }
        Ok(())
    }

    fn accepts(&self, building: &Actor) -> bool {
        self.repair_buildings
            .iter()
            .any(|name| name == building.actor_type())
            && building.traits().has::<RepairBay>()
    }
}

/// Stateless marker for units that can be repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeeksRepair;

/// Configuration for [`RepairBay`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairBayInfo {
    /// Hit points restored per repair step.
    pub hp_per_step: u32,
    /// Ticks between repair steps.
    pub interval_ticks: u32,
}

impl Default for RepairBayInfo {
    fn default() -> Self {
        Self {
            hp_per_step: 10,
            interval_ticks: 1,
        }
    }
}

impl RepairBayInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.hp_per_step == 0 {
            return Err("hp_per_step must be at least 1".to_owned());
        }
        if self.interval_ticks == 0 {
            return Err("interval_ticks must be at least 1".to_owned());
        }
        Ok(())
    }
}

/// Stateless marker for buildings that repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairBay;

pub(crate) fn resolves(verb: &str) -> bool {
    verb == verbs::ENTER
}

/// Right-click on one of the owner's listed repair buildings.
pub(crate) fn issue_order(info: &SeeksRepairInfo, ctx: &IssueContext<'_>) -> Option<Order> {
    if ctx.input.button != MouseButton::Right {
        return None;
    }
    let target = ctx.target?;
    let owner = ctx.actor.owner();
    if ctx.input.player != owner || target.owner() != owner || !info.accepts(target) {
        return None;
    }
    Some(
        Order::new(ctx.actor.id(), verbs::ENTER)
            .with_target_actor(target.id())
            .with_queued(ctx.input.modifiers.shift),
    )
}

/// Queue the visit: move onto the bay, rearm, repair, then leave for the
/// bay's rally point if it has one.
pub(crate) fn resolve_order(
    info: &SeeksRepairInfo,
    subject: &mut OrderSubject<'_>,
    ctx: &ResolveContext<'_>,
) {
    let Some(bay_id) = ctx.order.target_actor() else {
        return;
    };
    let Some(bay) = ctx.world.actor(bay_id) else {
        debug!(actor = %subject.id(), bay = %bay_id, "enter target is gone");
        return;
    };
    if bay.owner() != subject.owner() || !info.accepts(bay) {
        debug!(actor = %subject.id(), bay = %bay_id, "enter target cannot repair this unit");
        return;
    }

    // Read-only: the rally point as it stands when the order resolves.
    let rally = bay
        .traits()
        .get::<RallyPoint>()
        .and_then(|rally| rally.state().location());

    if !ctx.order.is_queued() {
        subject.cancel_activity();
    }
    subject.queue_activity(Activity::move_to(bay.position()));
    subject.queue_activity(Activity::rearm(bay_id));
    subject.queue_activity(Activity::repair(bay_id));
    if let Some(rally) = rally {
        subject.queue_activity(Activity::call(Callback::QueueMove(rally)));
    }
}
