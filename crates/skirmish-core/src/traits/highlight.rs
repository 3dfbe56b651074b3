//! `Highlight`: a display-only flash triggered by configured verbs.
//!
//! Several instances usually share one actor under different qualifiers
//! (`Highlight@LIGHTS`, `Highlight@DOOR`), each reacting to its own verbs.
//! Renderers read [`Highlight::is_flashing`]; nothing in the simulation
//! depends on it.

use serde::{Deserialize, Serialize};
use skirmish_types::verbs;

/// Configuration for [`Highlight`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightInfo {
    /// Verbs that start the flash.
    pub verbs: Vec<String>,
    /// How long one flash lasts.
    pub duration_ticks: u32,
}

impl Default for HighlightInfo {
    fn default() -> Self {
        Self {
            verbs: vec![verbs::ENTER.to_owned()],
            duration_ticks: 10,
        }
    }
}

impl HighlightInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.verbs.is_empty() {
            return Err("verbs must list at least one verb".to_owned());
        }
        if self.duration_ticks == 0 {
            return Err("duration_ticks must be at least 1".to_owned());
        }
        Ok(())
    }

    pub(crate) fn reacts_to(&self, verb: &str) -> bool {
        self.verbs.iter().any(|v| v == verb)
    }
}

/// Remaining flash time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    remaining: u32,
}

impl Highlight {
    /// Whether the flash is showing.
    pub const fn is_flashing(&self) -> bool {
        self.remaining > 0
    }

    /// Ticks of flash left.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) const fn trigger(&mut self, info: &HighlightInfo) {
        self.remaining = info.duration_ticks;
    }

    pub(crate) const fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}
