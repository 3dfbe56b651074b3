//! Turning player input into orders.

use skirmish_types::{ActorId, Order, PlayerId, WorldPos};
use tracing::trace;

use crate::world::{Actor, World};

/// Which mouse button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button: selection.
    Left,
    /// Secondary button: context orders.
    Right,
}

/// Keyboard modifiers held during the click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift: queue behind current behavior.
    pub shift: bool,
    /// Ctrl: force-fire and similar overrides.
    pub ctrl: bool,
}

/// A click from the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// The player who clicked.
    pub player: PlayerId,
    /// The button pressed.
    pub button: MouseButton,
    /// Modifiers held.
    pub modifiers: Modifiers,
}

impl InputEvent {
    /// A plain right-click by `player`.
    pub const fn right_click(player: PlayerId) -> Self {
        Self {
            player,
            button: MouseButton::Right,
            modifiers: Modifiers {
                shift: false,
                ctrl: false,
            },
        }
    }

    /// The same click with shift held.
    #[must_use]
    pub const fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// What an issue-capable trait sees when offered an input event.
pub struct IssueContext<'a> {
    /// The click.
    pub input: &'a InputEvent,
    /// The actor the order would come from.
    pub actor: &'a Actor,
    /// The clicked actor, if the click landed on one.
    pub target: Option<&'a Actor>,
    /// The clicked cell, if any.
    pub location: Option<WorldPos>,
    /// The whole world, read-only.
    pub world: &'a World,
}

/// Offer a click to the acting actor's issue-capable traits.
///
/// Traits are polled in declaration order and the first order produced wins.
/// Returns `None` if the acting actor is gone, the clicked actor is gone, or
/// every trait declines. Nothing is mutated.
pub fn try_issue(
    input: &InputEvent,
    acting: ActorId,
    target: Option<ActorId>,
    location: Option<WorldPos>,
    world: &World,
) -> Option<Order> {
    let actor = world.actor(acting)?;
    let target = match target {
        Some(id) => Some(world.actor(id)?),
        None => None,
    };
    let ctx = IssueContext {
        input,
        actor,
        target,
        location,
        world,
    };
    let order = actor
        .traits()
        .issuers()
        .find_map(|instance| instance.issue_order(&ctx));
    trace!(actor = %acting, verb = order.as_ref().map(Order::verb), "input offered");
    order
}
