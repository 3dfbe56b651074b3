//! Shared type definitions for the Skirmish lockstep simulation.
//!
//! This crate holds the plain value types that cross the boundary between
//! the simulation core and its collaborators: the network layer (orders and
//! order batches) and the renderer/UI (read-only snapshots). Types that a
//! browser UI consumes also derive `ts-rs` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Integer identifier wrappers for actors and players
//! - [`geometry`] -- Integer cell positions and eight-way facings
//! - [`order`] -- The immutable [`Order`] value and per-tick [`OrderBatch`]
//! - [`snapshot`] -- Read-only [`WorldSnapshot`] for presentation layers

pub mod geometry;
pub mod ids;
pub mod order;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use geometry::{Facing, WorldPos};
pub use ids::{ActorId, PlayerId};
pub use order::{Order, OrderBatch, PlayerOrders, verbs};
pub use snapshot::{ActivityKind, ActorSnapshot, AmmoView, HealthView, WorldSnapshot};
