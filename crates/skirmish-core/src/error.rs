//! Load-time configuration errors.
//!
//! A [`ConfigurationError`] means the rules handed to the core are malformed
//! or inconsistent. It is fatal at load and aborts startup; once a registry
//! has been built successfully, no configuration error can occur mid-match.

use crate::traits::{TraitKey, TraitKind};

/// Errors raised while loading or validating trait configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Failed to read the rules file from disk.
    #[error("failed to read rules file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the rules YAML.
    #[error("failed to parse rules YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A trait list entry did not contain exactly one `Kind[@qualifier]` key.
    #[error("actor type `{actor_type}`: trait entry {index} must have exactly one key, found {count}")]
    MalformedEntry {
        /// The actor type being loaded.
        actor_type: String,
        /// Zero-based position of the entry in the trait list.
        index: usize,
        /// Number of keys found in the entry.
        count: usize,
    },

    /// A trait key could not be parsed (empty qualifier, stray `@`).
    #[error("actor type `{actor_type}`: malformed trait key `{key}`")]
    MalformedKey {
        /// The actor type being loaded.
        actor_type: String,
        /// The raw key text.
        key: String,
    },

    /// The trait kind is not one the core knows how to build.
    #[error("actor type `{actor_type}`: unknown trait kind `{kind}`")]
    UnknownTrait {
        /// The actor type being loaded.
        actor_type: String,
        /// The unrecognised kind name.
        kind: String,
    },

    /// The trait's parameters failed to parse or validate.
    #[error("actor type `{actor_type}`: invalid parameters for `{key}`: {reason}")]
    InvalidParameters {
        /// The actor type being loaded.
        actor_type: String,
        /// The trait being configured.
        key: TraitKey,
        /// What is wrong with the parameters.
        reason: String,
    },

    /// The same `(kind, qualifier)` pair was declared twice.
    #[error("actor type `{actor_type}`: duplicate trait `{key}`")]
    DuplicateTrait {
        /// The actor type being loaded.
        actor_type: String,
        /// The repeated key.
        key: TraitKey,
    },

    /// A second unqualified instance of one kind was declared.
    #[error("actor type `{actor_type}`: more than one unqualified `{kind}` trait; qualify the extra instances")]
    AmbiguousTrait {
        /// The actor type being loaded.
        actor_type: String,
        /// The kind with ambiguous unqualified instances.
        kind: TraitKind,
    },

    /// A trait needs a sibling that is not declared before it.
    #[error("actor type `{actor_type}`: `{key}` requires a `{required}` trait declared before it")]
    MissingRequirement {
        /// The actor type being loaded.
        actor_type: String,
        /// The dependent trait.
        key: TraitKey,
        /// The sibling kind that must come first.
        required: TraitKind,
    },

    /// A trait references another actor type that cannot satisfy it.
    #[error("actor type `{actor_type}`: `{key}` references `{referenced}`, which {reason}")]
    BadReference {
        /// The actor type being loaded.
        actor_type: String,
        /// The trait holding the reference.
        key: TraitKey,
        /// The referenced actor type name.
        referenced: String,
        /// Why the reference is unusable.
        reason: String,
    },

    /// An actor type was requested that the rules do not define.
    #[error("unknown actor type `{0}`")]
    UnknownActorType(String),
}

impl From<serde_yml::Error> for ConfigurationError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
