//! Deterministic simulation core for the Skirmish RTS engine.
//!
//! Player input becomes [`Order`]s, orders are resolved by the traits
//! attached to actors, and resolved orders play out over ticks as queued
//! activities. Every participant of a match runs the same tick cycle on the
//! same order batches and reaches a bit-identical world.
//!
//! # Modules
//!
//! - [`activity`] -- Activity queue and the shipped activities.
//! - [`config`] -- Configuration loading from `skirmish-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- Rule loading and registry validation errors.
//! - [`locomotor`] -- The movement seam and its straight-line default.
//! - [`lockstep`] -- Per-tick submission barrier across participants.
//! - [`orders`] -- Issuing orders from input and resolving them.
//! - [`rng`] -- The synced per-tick random stream.
//! - [`save`] -- Save games and verified replay.
//! - [`sync`] -- State hashing and desync detection.
//! - [`tick`] -- The tick cycle engine loop.
//! - [`traits`] -- Trait kinds, per-actor trait sets, and the registry.
//! - [`world`] -- The entity store.
//!
//! [`Order`]: skirmish_types::Order

pub mod activity;
pub mod config;
pub mod error;
pub mod locomotor;
pub mod lockstep;
pub mod orders;
pub mod rng;
pub mod save;
pub mod sync;
pub mod tick;
pub mod traits;
pub mod world;

pub use tick::{Simulation, TickError, TickSummary};
pub use traits::TraitRegistry;
pub use world::{Actor, ActorInit, World};
