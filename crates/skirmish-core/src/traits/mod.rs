//! Trait composition: the closed set of behavior kinds attached to actors.
//!
//! Each kind has an immutable configuration record (`*Info`, one per actor
//! type, shared behind `Arc`) and a mutable per-actor state record. Both are
//! tagged variants ([`TraitInfo`], [`TraitState`]) so dispatch is a `match`,
//! never a runtime type scan. Instances are addressed by [`TraitKey`], the
//! `(kind, qualifier)` pair, which lets one actor carry several independently
//! configured instances of a kind (`AmmoPool@primary`, `AmmoPool@secondary`).
//!
//! # Modules
//!
//! - [`registry`] -- Loads and validates rules, instantiates [`TraitSet`]s
//! - [`set`] -- Per-actor ordered trait storage with capability indexes
//! - [`mobile`], [`health`], [`ammo`], [`repair`], [`rally_point`],
//!   [`highlight`], [`demolish`], [`production`] -- The shipped trait kinds

pub mod ammo;
pub mod demolish;
pub mod health;
pub mod highlight;
pub mod mobile;
pub mod production;
pub mod rally_point;
pub mod registry;
pub mod repair;
pub mod set;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skirmish_types::Order;

use crate::orders::{IssueContext, OrderSubject, ResolveContext};

pub use ammo::{AmmoPool, AmmoPoolInfo};
pub use demolish::{Demolishable, DemolishableInfo};
pub use health::{Health, HealthInfo};
pub use highlight::{Highlight, HighlightInfo};
pub use mobile::{Mobile, MobileInfo};
pub use production::{Production, ProductionInfo};
pub use rally_point::{RallyPoint, RallyPointInfo};
pub use registry::{TraitDecl, TraitRegistry};
pub use repair::{RepairBay, RepairBayInfo, SeeksRepair, SeeksRepairInfo};
pub use set::{TraitMut, TraitRef, TraitSet};

// ---------------------------------------------------------------------------
// Kinds and keys
// ---------------------------------------------------------------------------

/// The closed set of trait kinds the core can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    /// Can move; issues and resolves `Move` and `Stop`.
    Mobile,
    /// Hit points.
    Health,
    /// Reloadable ammunition.
    AmmoPool,
    /// Can be sent to a repair bay with `Enter`.
    SeeksRepair,
    /// Repairs actors standing on it.
    RepairBay,
    /// A building's rally point for units leaving it.
    RallyPoint,
    /// A display-only flash that reacts to configured verbs.
    Highlight,
    /// Can self-destruct on `Demolish`.
    Demolishable,
    /// Builds new actors on `Produce`.
    Production,
}

impl TraitKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Mobile,
        Self::Health,
        Self::AmmoPool,
        Self::SeeksRepair,
        Self::RepairBay,
        Self::RallyPoint,
        Self::Highlight,
        Self::Demolishable,
        Self::Production,
    ];

    /// The name used for this kind in rule files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Health => "Health",
            Self::AmmoPool => "AmmoPool",
            Self::SeeksRepair => "SeeksRepair",
            Self::RepairBay => "RepairBay",
            Self::RallyPoint => "RallyPoint",
            Self::Highlight => "Highlight",
            Self::Demolishable => "Demolishable",
            Self::Production => "Production",
        }
    }

    /// Look a kind up by its rule-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Sibling kinds that must be declared before this one.
    pub const fn requires(self) -> &'static [Self] {
        match self {
            Self::SeeksRepair => &[Self::Mobile, Self::Health],
            Self::Mobile
            | Self::Health
            | Self::AmmoPool
            | Self::RepairBay
            | Self::RallyPoint
            | Self::Highlight
            | Self::Demolishable
            | Self::Production => &[],
        }
    }

    /// The capability roles instances of this kind fill.
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Mobile | Self::SeeksRepair | Self::RallyPoint => {
                &[Capability::IssueOrder, Capability::ResolveOrder]
            }
            Self::Highlight => &[Capability::ResolveOrder, Capability::Tick],
            Self::Demolishable | Self::Production => &[Capability::ResolveOrder],
            Self::Health | Self::AmmoPool | Self::RepairBay => &[],
        }
    }

    /// Whether instances of this kind fill `capability`.
    pub fn has_capability(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for TraitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A capability role a trait instance may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Converts input into an order.
    IssueOrder,
    /// Applies resolved orders.
    ResolveOrder,
    /// Runs once per tick after activity advancement.
    Tick,
}

/// Addresses one trait instance on an actor: `Kind` or `Kind@qualifier`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraitKey {
    /// The trait kind.
    pub kind: TraitKind,
    /// Distinguishes several instances of one kind.
    pub qualifier: Option<String>,
}

/// Why a trait key failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    /// The text is not `Kind` or `Kind@qualifier`.
    Malformed,
    /// The kind is not one the core knows.
    UnknownKind(String),
}

impl TraitKey {
    /// An unqualified key.
    pub const fn unqualified(kind: TraitKind) -> Self {
        Self {
            kind,
            qualifier: None,
        }
    }

    /// A qualified key.
    pub fn qualified(kind: TraitKind, qualifier: impl Into<String>) -> Self {
        Self {
            kind,
            qualifier: Some(qualifier.into()),
        }
    }

    /// Parse `Kind` or `Kind@qualifier`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyParseError::Malformed`] for an empty kind or qualifier or
    /// a second `@`, and [`KeyParseError::UnknownKind`] for an unknown kind.
    pub fn parse(raw: &str) -> Result<Self, KeyParseError> {
        let (kind_name, qualifier) = match raw.split_once('@') {
            Some((kind, qualifier)) => {
                if qualifier.is_empty() || qualifier.contains('@') {
                    return Err(KeyParseError::Malformed);
                }
                (kind, Some(qualifier.to_owned()))
            }
            None => (raw, None),
        };
        if kind_name.is_empty() || kind_name.trim() != kind_name {
            return Err(KeyParseError::Malformed);
        }
        let kind = TraitKind::from_name(kind_name)
            .ok_or_else(|| KeyParseError::UnknownKind(kind_name.to_owned()))?;
        Ok(Self { kind, qualifier })
    }
}

impl fmt::Display for TraitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}@{qualifier}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration and state records
// ---------------------------------------------------------------------------

/// Immutable per-type configuration of one trait instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitInfo {
    /// See [`MobileInfo`].
    Mobile(MobileInfo),
    /// See [`HealthInfo`].
    Health(HealthInfo),
    /// See [`AmmoPoolInfo`].
    AmmoPool(AmmoPoolInfo),
    /// See [`SeeksRepairInfo`].
    SeeksRepair(SeeksRepairInfo),
    /// See [`RepairBayInfo`].
    RepairBay(RepairBayInfo),
    /// See [`RallyPointInfo`].
    RallyPoint(RallyPointInfo),
    /// See [`HighlightInfo`].
    Highlight(HighlightInfo),
    /// See [`DemolishableInfo`].
    Demolishable(DemolishableInfo),
    /// See [`ProductionInfo`].
    Production(ProductionInfo),
}

impl TraitInfo {
    /// Decode the parameters of a `kind` entry from a rule file.
    ///
    /// A bare key with no parameters (`- Mobile:`) takes every default.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for unknown fields or mistyped values.
    pub fn from_params(kind: TraitKind, params: serde_yml::Value) -> Result<Self, serde_yml::Error> {
        let params = match params {
            serde_yml::Value::Null => serde_yml::Value::Mapping(serde_yml::Mapping::new()),
            other => other,
        };
        Ok(match kind {
            TraitKind::Mobile => Self::Mobile(serde_yml::from_value(params)?),
            TraitKind::Health => Self::Health(serde_yml::from_value(params)?),
            TraitKind::AmmoPool => Self::AmmoPool(serde_yml::from_value(params)?),
            TraitKind::SeeksRepair => Self::SeeksRepair(serde_yml::from_value(params)?),
            TraitKind::RepairBay => Self::RepairBay(serde_yml::from_value(params)?),
            TraitKind::RallyPoint => Self::RallyPoint(serde_yml::from_value(params)?),
            TraitKind::Highlight => Self::Highlight(serde_yml::from_value(params)?),
            TraitKind::Demolishable => Self::Demolishable(serde_yml::from_value(params)?),
            TraitKind::Production => Self::Production(serde_yml::from_value(params)?),
        })
    }

    /// The kind this configuration belongs to.
    pub const fn kind(&self) -> TraitKind {
        match self {
            Self::Mobile(_) => TraitKind::Mobile,
            Self::Health(_) => TraitKind::Health,
            Self::AmmoPool(_) => TraitKind::AmmoPool,
            Self::SeeksRepair(_) => TraitKind::SeeksRepair,
            Self::RepairBay(_) => TraitKind::RepairBay,
            Self::RallyPoint(_) => TraitKind::RallyPoint,
            Self::Highlight(_) => TraitKind::Highlight,
            Self::Demolishable(_) => TraitKind::Demolishable,
            Self::Production(_) => TraitKind::Production,
        }
    }

    /// Check numeric and list parameters.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid parameter.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Mobile(info) => info.validate(),
            Self::Health(info) => info.validate(),
            Self::AmmoPool(info) => info.validate(),
            Self::SeeksRepair(info) => info.validate(),
            Self::RepairBay(info) => info.validate(),
            Self::Highlight(info) => info.validate(),
            Self::Production(info) => info.validate(),
            Self::RallyPoint(_) | Self::Demolishable(_) => Ok(()),
        }
    }

    /// Whether an instance with this configuration resolves `verb`.
    pub fn resolves(&self, verb: &str) -> bool {
        match self {
            Self::Mobile(_) => mobile::resolves(verb),
            Self::SeeksRepair(_) => repair::resolves(verb),
            Self::RallyPoint(_) => rally_point::resolves(verb),
            Self::Highlight(info) => info.reacts_to(verb),
            Self::Demolishable(_) => demolish::resolves(verb),
            Self::Production(_) => production::resolves(verb),
            Self::Health(_) | Self::AmmoPool(_) | Self::RepairBay(_) => false,
        }
    }

    /// The state a freshly created instance starts with.
    pub fn initial_state(&self) -> TraitState {
        match self {
            Self::Mobile(_) => TraitState::Mobile(Mobile),
            Self::Health(info) => TraitState::Health(Health::new(info)),
            Self::AmmoPool(info) => TraitState::AmmoPool(AmmoPool::new(info)),
            Self::SeeksRepair(_) => TraitState::SeeksRepair(SeeksRepair),
            Self::RepairBay(_) => TraitState::RepairBay(RepairBay),
            Self::RallyPoint(_) => TraitState::RallyPoint(RallyPoint::default()),
            Self::Highlight(_) => TraitState::Highlight(Highlight::default()),
            Self::Demolishable(_) => TraitState::Demolishable(Demolishable::default()),
            Self::Production(_) => TraitState::Production(Production),
        }
    }
}

/// Mutable per-actor state of one trait instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraitState {
    /// See [`Mobile`].
    Mobile(Mobile),
    /// See [`Health`].
    Health(Health),
    /// See [`AmmoPool`].
    AmmoPool(AmmoPool),
    /// See [`SeeksRepair`].
    SeeksRepair(SeeksRepair),
    /// See [`RepairBay`].
    RepairBay(RepairBay),
    /// See [`RallyPoint`].
    RallyPoint(RallyPoint),
    /// See [`Highlight`].
    Highlight(Highlight),
    /// See [`Demolishable`].
    Demolishable(Demolishable),
    /// See [`Production`].
    Production(Production),
}

impl TraitState {
    /// The kind this state belongs to.
    pub const fn kind(&self) -> TraitKind {
        match self {
            Self::Mobile(_) => TraitKind::Mobile,
            Self::Health(_) => TraitKind::Health,
            Self::AmmoPool(_) => TraitKind::AmmoPool,
            Self::SeeksRepair(_) => TraitKind::SeeksRepair,
            Self::RepairBay(_) => TraitKind::RepairBay,
            Self::RallyPoint(_) => TraitKind::RallyPoint,
            Self::Highlight(_) => TraitKind::Highlight,
            Self::Demolishable(_) => TraitKind::Demolishable,
            Self::Production(_) => TraitKind::Production,
        }
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

/// A state record that can be looked up by type on a [`TraitSet`].
pub trait TraitComponent: Sized + 'static {
    /// The matching configuration record.
    type Info: 'static;

    /// The kind tag shared by `Self` and `Self::Info`.
    const KIND: TraitKind;

    /// Borrow this state out of a tagged state, if the tag matches.
    fn from_state(state: &TraitState) -> Option<&Self>;

    /// Mutably borrow this state out of a tagged state, if the tag matches.
    fn from_state_mut(state: &mut TraitState) -> Option<&mut Self>;

    /// Borrow the configuration out of a tagged info, if the tag matches.
    fn info_of(info: &TraitInfo) -> Option<&Self::Info>;
}

macro_rules! trait_component {
    ($($kind:ident => $info:ident),* $(,)?) => {
        $(
            impl TraitComponent for $kind {
                type Info = $info;

                const KIND: TraitKind = TraitKind::$kind;

                fn from_state(state: &TraitState) -> Option<&Self> {
                    match state {
                        TraitState::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_state_mut(state: &mut TraitState) -> Option<&mut Self> {
                    match state {
                        TraitState::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn info_of(info: &TraitInfo) -> Option<&Self::Info> {
                    match info {
                        TraitInfo::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

trait_component! {
    Mobile => MobileInfo,
    Health => HealthInfo,
    AmmoPool => AmmoPoolInfo,
    SeeksRepair => SeeksRepairInfo,
    RepairBay => RepairBayInfo,
    RallyPoint => RallyPointInfo,
    Highlight => HighlightInfo,
    Demolishable => DemolishableInfo,
    Production => ProductionInfo,
}

// ---------------------------------------------------------------------------
// Instances and capability dispatch
// ---------------------------------------------------------------------------

/// One trait attached to one actor: its key, shared configuration and own state.
#[derive(Debug, Clone)]
pub struct TraitInstance {
    key: TraitKey,
    info: Arc<TraitInfo>,
    state: TraitState,
}

impl TraitInstance {
    pub(crate) fn new(key: TraitKey, info: Arc<TraitInfo>) -> Self {
        let state = info.initial_state();
        Self { key, info, state }
    }

    /// The instance's key.
    pub const fn key(&self) -> &TraitKey {
        &self.key
    }

    /// The instance's kind.
    pub const fn kind(&self) -> TraitKind {
        self.key.kind
    }

    /// The shared configuration.
    pub fn info(&self) -> &TraitInfo {
        &self.info
    }

    /// The instance's state.
    pub const fn state(&self) -> &TraitState {
        &self.state
    }

    pub(crate) fn replace_state(&mut self, state: TraitState) -> bool {
        if state.kind() != self.key.kind {
            return false;
        }
        self.state = state;
        true
    }

    /// Offer an input event to an issue-capable instance.
    pub(crate) fn issue_order(&self, ctx: &IssueContext<'_>) -> Option<Order> {
        match (&*self.info, &self.state) {
            (TraitInfo::Mobile(info), TraitState::Mobile(_)) => mobile::issue_order(info, ctx),
            (TraitInfo::SeeksRepair(info), TraitState::SeeksRepair(_)) => {
                repair::issue_order(info, ctx)
            }
            (TraitInfo::RallyPoint(info), TraitState::RallyPoint(_)) => {
                rally_point::issue_order(info, ctx)
            }
            _ => None,
        }
    }

    /// Apply a resolved order to a resolve-capable instance.
    pub(crate) fn resolve_order(&mut self, subject: &mut OrderSubject<'_>, ctx: &mut ResolveContext<'_>) {
        match (&*self.info, &mut self.state) {
            (TraitInfo::Mobile(info), TraitState::Mobile(_)) => {
                mobile::resolve_order(info, subject, ctx);
            }
            (TraitInfo::SeeksRepair(info), TraitState::SeeksRepair(_)) => {
                repair::resolve_order(info, subject, ctx);
            }
            (TraitInfo::RallyPoint(_), TraitState::RallyPoint(state)) => {
                state.resolve_order(ctx);
            }
            (TraitInfo::Highlight(info), TraitState::Highlight(state)) => {
                state.trigger(info);
            }
            (TraitInfo::Demolishable(info), TraitState::Demolishable(state)) => {
                state.resolve_order(info, subject, ctx);
            }
            (TraitInfo::Production(info), TraitState::Production(_)) => {
                production::resolve_order(info, subject, ctx);
            }
            _ => {}
        }
    }

    /// Run a tick-capable instance's per-tick update.
    pub(crate) fn tick(&mut self) {
        if let TraitState::Highlight(state) = &mut self.state {
            state.tick();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn key_parse_accepts_plain_and_qualified() {
        assert_eq!(
            TraitKey::parse("Mobile").unwrap(),
            TraitKey::unqualified(TraitKind::Mobile)
        );
        assert_eq!(
            TraitKey::parse("Highlight@LIGHTS").unwrap(),
            TraitKey::qualified(TraitKind::Highlight, "LIGHTS")
        );
    }

    #[test]
    fn key_parse_rejects_malformed_keys() {
        assert_eq!(TraitKey::parse("Mobile@"), Err(KeyParseError::Malformed));
        assert_eq!(TraitKey::parse("@x"), Err(KeyParseError::Malformed));
        assert_eq!(TraitKey::parse("AmmoPool@a@b"), Err(KeyParseError::Malformed));
        assert_eq!(
            TraitKey::parse("Teleporter"),
            Err(KeyParseError::UnknownKind("Teleporter".to_owned()))
        );
    }

    #[test]
    fn key_display_round_trips_through_parse() {
        let key = TraitKey::qualified(TraitKind::AmmoPool, "secondary");
        assert_eq!(key.to_string(), "AmmoPool@secondary");
        assert_eq!(TraitKey::parse(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn null_params_take_defaults() {
        let info = TraitInfo::from_params(TraitKind::Mobile, serde_yml::Value::Null).unwrap();
        assert_eq!(info, TraitInfo::Mobile(MobileInfo::default()));
    }

    #[test]
    fn unknown_param_fields_are_rejected() {
        let params: serde_yml::Value = serde_yml::from_str("{ speed: 2, sped: 3 }").unwrap();
        assert!(TraitInfo::from_params(TraitKind::Mobile, params).is_err());
    }

    #[test]
    fn capability_table_matches_dispatch() {
        assert!(TraitKind::Mobile.has_capability(Capability::IssueOrder));
        assert!(TraitKind::Highlight.has_capability(Capability::Tick));
        assert!(!TraitKind::Health.has_capability(Capability::ResolveOrder));
        assert_eq!(TraitKind::SeeksRepair.requires(), &[TraitKind::Mobile, TraitKind::Health]);
    }

    #[test]
    fn initial_state_matches_kind() {
        for kind in TraitKind::ALL {
            let info = TraitInfo::from_params(kind, serde_yml::Value::Null).unwrap();
            assert_eq!(info.initial_state().kind(), kind);
        }
    }
}
