//! Save games and deterministic replay.
//!
//! A save carries both the current state and everything needed to rebuild
//! it from scratch: the seed, the initial spawns and every order batch run
//! so far. [`SaveGame::restore`] resumes from the stored state directly;
//! [`SaveGame::replay`] re-simulates from tick 0, and [`SaveGame::verify`]
//! checks that the two agree.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skirmish_types::OrderBatch;
use tracing::{info, warn};

use crate::tick::{Simulation, TickError};
use crate::traits::TraitRegistry;
use crate::world::{ActorInit, ActorRecord, World, WorldError};

/// Errors raised while saving, loading or replaying.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The save could not be read or written.
    #[error("save file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The save is not valid JSON for this format.
    #[error("save encoding failed: {source}")]
    Json {
        /// The underlying encoding error.
        #[from]
        source: serde_json::Error,
    },

    /// The stored actors do not fit the rules.
    #[error("save does not match the rules: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A recorded batch could not be re-run.
    #[error("replay failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// Replaying the history produced a different state.
    #[error("replay diverged from the saved state at tick {tick}")]
    ReplayMismatch {
        /// The tick the save was taken at.
        tick: u64,
    },
}

/// A complete, self-verifying snapshot of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Session seed.
    pub seed: u64,
    /// Ticks completed when the save was taken.
    pub tick: u64,
    /// The id the next spawned actor gets.
    pub next_actor_id: u32,
    /// Initial spawns, in spawn order.
    pub map: Vec<ActorInit>,
    /// Every actor at save time, with trait state and activity queue.
    pub actors: Vec<ActorRecord>,
    /// Every batch run, in tick order.
    pub history: Vec<OrderBatch>,
}

impl SaveGame {
    /// Capture `sim` between ticks.
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            seed: sim.seed(),
            tick: sim.tick(),
            next_actor_id: sim.world().next_id(),
            map: sim.map().to_vec(),
            actors: sim.world().records(),
            history: sim.history().to_vec(),
        }
    }

    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Json`] if the text is not a save.
    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if encoding or writing fails.
    pub fn write_to(&self, path: &Path) -> Result<(), SaveError> {
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), tick = self.tick, actors = self.actors.len(), "save written");
        Ok(())
    }

    /// Read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if reading or decoding fails.
    pub fn read_from(path: &Path) -> Result<Self, SaveError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resume from the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::World`] if a stored actor does not fit the rules.
    pub fn restore(&self, registry: Arc<TraitRegistry>) -> Result<Simulation, SaveError> {
        let world = World::restore(&registry, self.next_actor_id, &self.actors)?;
        Ok(Simulation::from_parts(
            registry,
            self.seed,
            self.tick,
            world,
            self.map.clone(),
            self.history.clone(),
        ))
    }

    /// Rebuild the match from tick 0 by re-running the history.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if a spawn or a recorded batch fails.
    pub fn replay(&self, registry: Arc<TraitRegistry>) -> Result<Simulation, SaveError> {
        let mut sim = Simulation::new(registry, self.seed).with_hash_interval(0);
        for init in &self.map {
            sim.spawn(init.clone())?;
        }
        for batch in &self.history {
            sim.run_tick(batch)?;
        }
        Ok(sim)
    }

    /// Replay the history and check it reproduces the stored state exactly.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::ReplayMismatch`] on divergence, or the replay's
    /// own error.
    pub fn verify(&self, registry: Arc<TraitRegistry>) -> Result<(), SaveError> {
        let replayed = self.replay(registry)?;
        let matches = replayed.tick() == self.tick
            && replayed.world().next_id() == self.next_actor_id
            && replayed.world().records() == self.actors;
        if !matches {
            warn!(tick = self.tick, replayed_tick = replayed.tick(), "replay diverged");
            return Err(SaveError::ReplayMismatch { tick: self.tick });
        }
        info!(tick = self.tick, "replay verified");
        Ok(())
    }
}
