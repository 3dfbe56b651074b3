//! The order protocol: input becomes an [`Order`], and orders become
//! activities.
//!
//! Issuing ([`issue`]) is local and speculative: it reads the world and
//! produces a value for the network layer to transmit. Resolving
//! ([`resolve`]) is authoritative and runs identically on every participant
//! when the tick scheduler reaches the order's tick.
//!
//! [`Order`]: skirmish_types::Order

pub mod issue;
pub mod resolve;

pub use issue::{InputEvent, IssueContext, Modifiers, MouseButton, try_issue};
pub use resolve::{OrderSubject, ResolveContext, ResolveOutcome, resolve_order};
