//! Session configuration for a Skirmish match.
//!
//! The canonical configuration lives in `skirmish-config.yaml` at the project
//! root. The structs here mirror its layout; every field has a default so a
//! partial (or empty) file is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides `session.seed`.
pub const SEED_ENV_VAR: &str = "SKIRMISH_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// `SKIRMISH_SEED` was set but is not an unsigned integer.
    #[error("{SEED_ENV_VAR} must be an unsigned integer, got `{value}`: {source}")]
    InvalidSeedOverride {
        /// The rejected value.
        value: String,
        /// Why it did not parse.
        source: std::num::ParseIntError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Match timing and determinism settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Where the trait rules live.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `SKIRMISH_SEED` overrides `session.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidSeedOverride`] for a malformed override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidSeedOverride`] for a malformed override.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config
            .session
            .apply_seed_override(std::env::var(SEED_ENV_VAR).ok().as_deref())?;
        Ok(config)
    }
}

/// Match timing and determinism settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Session seed shared by every participant.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Ticks between issuing an order and resolving it.
    #[serde(default = "default_order_latency")]
    pub order_latency: u64,

    /// Stop after this many ticks.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Compute and compare a state hash every this many ticks.
    #[serde(default = "default_hash_interval")]
    pub hash_interval: u64,

    /// Number of in-process peers the engine runs in lockstep.
    #[serde(default = "default_peers")]
    pub peers: u32,

    /// Optional path to write a save game to when the run finishes.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Replace the seed with `value` when an override is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSeedOverride`] if `value` is not a `u64`.
    pub fn apply_seed_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = value {
            self.seed = raw
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidSeedOverride {
                    value: raw.to_owned(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            order_latency: default_order_latency(),
            max_ticks: default_max_ticks(),
            hash_interval: default_hash_interval(),
            peers: default_peers(),
            save_path: None,
        }
    }
}

/// Rules file location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Path to the trait rules YAML.
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_order_latency() -> u64 {
    2
}

const fn default_max_ticks() -> u64 {
    100
}

const fn default_hash_interval() -> u64 {
    1
}

const fn default_peers() -> u32 {
    2
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("rules/skirmish-rules.yaml")
}

fn default_log_level() -> String {
    "info".to_owned()
}
