//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the lockstep run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Session configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skirmish_core::config::ConfigError,
    },

    /// The trait rules are invalid.
    #[error("rules error: {source}")]
    Rules {
        /// The underlying rules error.
        #[from]
        source: skirmish_core::error::ConfigurationError,
    },

    /// The scenario file could not be loaded or is inconsistent.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of the scenario failure.
        message: String,
    },

    /// A tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: skirmish_core::tick::TickError,
    },

    /// The lockstep barrier rejected a submission.
    #[error("lockstep error: {source}")]
    Lockstep {
        /// The underlying lockstep error.
        #[from]
        source: skirmish_core::lockstep::LockstepError,
    },

    /// Two peers disagree on the state hash.
    #[error("desync: {source}")]
    Desync {
        /// The underlying desync report.
        #[from]
        source: skirmish_core::sync::DesyncError,
    },

    /// Writing or verifying the save failed.
    #[error("save error: {source}")]
    Save {
        /// The underlying save error.
        #[from]
        source: skirmish_core::save::SaveError,
    },
}
