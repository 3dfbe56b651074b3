//! Orders and per-tick order batches.
//!
//! An [`Order`] is the immutable intent value that travels from a player's
//! input, through the network layer, to authoritative resolution on every
//! participant. An [`OrderBatch`] is the complete, identically ordered set of
//! orders that every participant resolves for one tick.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geometry::WorldPos;
use crate::ids::{ActorId, PlayerId};

/// Well-known order verbs understood by the shipped traits.
pub mod verbs {
    /// Move to the target location.
    pub const MOVE: &str = "Move";
    /// Drop everything and go idle.
    pub const STOP: &str = "Stop";
    /// Enter the target actor (repair bays, transports, ...).
    pub const ENTER: &str = "Enter";
    /// Set the acting building's rally point to the target location.
    pub const SET_RALLY_POINT: &str = "SetRallyPoint";
    /// Self-destruct the acting actor after its configured delay.
    pub const DEMOLISH: &str = "Demolish";
    /// Build the actor type named in the order's string payload.
    pub const PRODUCE: &str = "Produce";
}

/// One resolved intent: a verb issued by a source actor.
///
/// Orders are immutable once constructed. The builder methods consume the
/// order and return a new value, so a transmitted order can never be edited
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Order {
    source: ActorId,
    verb: String,
    #[serde(default)]
    target_actor: Option<ActorId>,
    #[serde(default)]
    target_location: Option<WorldPos>,
    #[serde(default)]
    target_string: Option<String>,
    #[serde(default)]
    extra_data: u32,
    #[serde(default)]
    queued: bool,
}

impl Order {
    /// Create an order with no target and an empty payload.
    pub fn new(source: ActorId, verb: impl Into<String>) -> Self {
        Self {
            source,
            verb: verb.into(),
            target_actor: None,
            target_location: None,
            target_string: None,
            extra_data: 0,
            queued: false,
        }
    }

    /// Attach a target actor.
    #[must_use]
    pub const fn with_target_actor(mut self, target: ActorId) -> Self {
        self.target_actor = Some(target);
        self
    }

    /// Attach a target location.
    #[must_use]
    pub const fn with_target_location(mut self, location: WorldPos) -> Self {
        self.target_location = Some(location);
        self
    }

    /// Attach a free-form string payload.
    #[must_use]
    pub fn with_target_string(mut self, value: impl Into<String>) -> Self {
        self.target_string = Some(value.into());
        self
    }

    /// Attach a numeric payload.
    #[must_use]
    pub const fn with_extra_data(mut self, extra: u32) -> Self {
        self.extra_data = extra;
        self
    }

    /// Mark the order as queued behind current behavior instead of replacing it.
    #[must_use]
    pub const fn with_queued(mut self, queued: bool) -> Self {
        self.queued = queued;
        self
    }

    /// The actor that issued the order.
    pub const fn source(&self) -> ActorId {
        self.source
    }

    /// The verb naming the intended action.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// The target actor, if any.
    pub const fn target_actor(&self) -> Option<ActorId> {
        self.target_actor
    }

    /// The target location, if any.
    pub const fn target_location(&self) -> Option<WorldPos> {
        self.target_location
    }

    /// The free-form string payload, if any.
    pub fn target_string(&self) -> Option<&str> {
        self.target_string.as_deref()
    }

    /// The numeric payload.
    pub const fn extra_data(&self) -> u32 {
        self.extra_data
    }

    /// Whether the order appends to current behavior.
    pub const fn is_queued(&self) -> bool {
        self.queued
    }
}

/// The orders one participant submitted for a tick, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerOrders {
    /// The submitting participant.
    pub player: PlayerId,
    /// Orders in submission order.
    pub orders: Vec<Order>,
}

/// The complete order batch for one tick.
///
/// Participants are kept sorted by [`PlayerId`]; within a participant,
/// submission order is preserved. Iterating a batch therefore yields the
/// same sequence on every machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OrderBatch {
    /// The tick these orders resolve on.
    pub tick: u64,
    /// Per-participant orders, sorted by player.
    pub players: Vec<PlayerOrders>,
}

impl OrderBatch {
    /// Create an empty batch for `tick`.
    pub const fn new(tick: u64) -> Self {
        Self {
            tick,
            players: Vec::new(),
        }
    }

    /// Append `order` to `player`'s submissions, keeping players sorted.
    pub fn push(&mut self, player: PlayerId, order: Order) {
        match self.players.binary_search_by_key(&player, |p| p.player) {
            Ok(idx) => {
                if let Some(entry) = self.players.get_mut(idx) {
                    entry.orders.push(order);
                }
            }
            Err(idx) => self.players.insert(
                idx,
                PlayerOrders {
                    player,
                    orders: vec![order],
                },
            ),
        }
    }

    /// Append every order in `orders` to `player`'s submissions.
    pub fn extend(&mut self, player: PlayerId, orders: impl IntoIterator<Item = Order>) {
        for order in orders {
            self.push(player, order);
        }
    }

    /// Iterate `(player, order)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &Order)> {
        self.players
            .iter()
            .flat_map(|p| p.orders.iter().map(move |o| (p.player, o)))
    }

    /// Total number of orders in the batch.
    pub fn len(&self) -> usize {
        self.players.iter().map(|p| p.orders.len()).sum()
    }

    /// Whether the batch carries no orders.
    pub fn is_empty(&self) -> bool {
        self.players.iter().all(|p| p.orders.is_empty())
    }
}
