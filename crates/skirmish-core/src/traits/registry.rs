//! The trait registry: validated, immutable rules per actor type.
//!
//! Rule files look like:
//!
//! ```yaml
//! actors:
//!   tank:
//!     traits:
//!       - Mobile: { speed: 1 }
//!       - Health: { max_hp: 100 }
//!       - SeeksRepair: { repair_buildings: [fix] }
//!       - AmmoPool@primary: { capacity: 4, reload_ticks: 2 }
//! ```
//!
//! The trait list is ordered; that order is the declaration order used for
//! issue priority and resolution broadcast. Every inconsistency is reported
//! at load as a [`ConfigurationError`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigurationError;
use crate::traits::{KeyParseError, TraitInfo, TraitKey, TraitKind, TraitSet};

/// One validated trait declaration of an actor type.
#[derive(Debug, Clone)]
pub struct TraitDecl {
    /// The instance key.
    pub key: TraitKey,
    /// The shared configuration.
    pub info: Arc<TraitInfo>,
}

/// Validated rules for every actor type. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct TraitRegistry {
    actors: BTreeMap<String, Vec<TraitDecl>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRules {
    #[serde(default)]
    actors: BTreeMap<String, RawActor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawActor {
    #[serde(default)]
    traits: Vec<BTreeMap<String, serde_yml::Value>>,
}

impl TraitRegistry {
    /// Load rules from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`] if the file cannot be read, or any
    /// validation error from [`TraitRegistry::from_yaml`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml(&contents)?;
        info!(path = %path.display(), actor_types = registry.actors.len(), "rules loaded");
        Ok(registry)
    }

    /// Parse and validate rules from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first problem found.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let raw: RawRules = serde_yml::from_str(yaml)?;
        let mut definitions = BTreeMap::new();
        for (actor_type, actor) in raw.actors {
            let mut decls = Vec::with_capacity(actor.traits.len());
            for (index, entry) in actor.traits.into_iter().enumerate() {
                decls.push(parse_entry(&actor_type, index, entry)?);
            }
            definitions.insert(actor_type, decls);
        }
        Self::from_definitions(definitions)
    }

    /// Build a registry from already-decoded declarations.
    ///
    /// Runs the same validation as [`TraitRegistry::from_yaml`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first problem found.
    pub fn from_definitions(
        definitions: BTreeMap<String, Vec<(TraitKey, TraitInfo)>>,
    ) -> Result<Self, ConfigurationError> {
        let mut actors = BTreeMap::new();
        for (actor_type, decls) in definitions {
            let decls = validate_actor(&actor_type, decls)?;
            actors.insert(actor_type, decls);
        }
        let registry = Self { actors };
        registry.validate_references()?;
        Ok(registry)
    }

    /// Whether `actor_type` is defined.
    pub fn contains(&self, actor_type: &str) -> bool {
        self.actors.contains_key(actor_type)
    }

    /// Defined actor type names, sorted.
    pub fn actor_types(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(String::as_str)
    }

    /// The ordered declarations of `actor_type`.
    pub fn traits_for(&self, actor_type: &str) -> Option<&[TraitDecl]> {
        self.actors.get(actor_type).map(Vec::as_slice)
    }

    /// Instantiate a fresh trait set for `actor_type`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownActorType`] for an undefined type.
    pub fn create(&self, actor_type: &str) -> Result<TraitSet, ConfigurationError> {
        let decls = self
            .traits_for(actor_type)
            .ok_or_else(|| ConfigurationError::UnknownActorType(actor_type.to_owned()))?;
        let mut set = TraitSet::default();
        for decl in decls {
            set.push(decl.key.clone(), Arc::clone(&decl.info));
        }
        Ok(set)
    }

    fn has_kind(&self, actor_type: &str, kind: TraitKind) -> Option<bool> {
        self.traits_for(actor_type)
            .map(|decls| decls.iter().any(|decl| decl.key.kind == kind))
    }

    fn validate_references(&self) -> Result<(), ConfigurationError> {
        for (actor_type, decls) in &self.actors {
            for decl in decls {
                let bad_reference = |referenced: &str, reason: &str| ConfigurationError::BadReference {
                    actor_type: actor_type.clone(),
                    key: decl.key.clone(),
                    referenced: referenced.to_owned(),
                    reason: reason.to_owned(),
                };
                match &*decl.info {
                    TraitInfo::SeeksRepair(seeks) => {
                        for building in &seeks.repair_buildings {
                            let reason = match self.has_kind(building, TraitKind::RepairBay) {
                                None => "is not a defined actor type",
                                Some(false) => "has no RepairBay trait",
                                Some(true) => continue,
                            };
                            return Err(bad_reference(building, reason));
                        }
                    }
                    TraitInfo::Production(production) => {
                        if let Some(unit) = production.produces.iter().find(|unit| !self.contains(unit)) {
                            return Err(bad_reference(unit, "is not a defined actor type"));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn parse_entry(
    actor_type: &str,
    index: usize,
    entry: BTreeMap<String, serde_yml::Value>,
) -> Result<(TraitKey, TraitInfo), ConfigurationError> {
    let count = entry.len();
    let mut entries = entry.into_iter();
    let (Some((raw_key, params)), None) = (entries.next(), entries.next()) else {
        return Err(ConfigurationError::MalformedEntry {
            actor_type: actor_type.to_owned(),
            index,
            count,
        });
    };

    let key = TraitKey::parse(&raw_key).map_err(|err| match err {
        KeyParseError::Malformed => ConfigurationError::MalformedKey {
            actor_type: actor_type.to_owned(),
            key: raw_key.clone(),
        },
        KeyParseError::UnknownKind(kind) => ConfigurationError::UnknownTrait {
            actor_type: actor_type.to_owned(),
            kind,
        },
    })?;

    let info = TraitInfo::from_params(key.kind, params).map_err(|err| {
        ConfigurationError::InvalidParameters {
            actor_type: actor_type.to_owned(),
            key: key.clone(),
            reason: err.to_string(),
        }
    })?;
    Ok((key, info))
}

fn validate_actor(
    actor_type: &str,
    decls: Vec<(TraitKey, TraitInfo)>,
) -> Result<Vec<TraitDecl>, ConfigurationError> {
    let mut seen_keys = BTreeSet::new();
    let mut seen_kinds = BTreeSet::new();
    let mut validated = Vec::with_capacity(decls.len());

    for (key, info) in decls {
        if info.kind() != key.kind {
            return Err(ConfigurationError::InvalidParameters {
                actor_type: actor_type.to_owned(),
                key,
                reason: format!("configuration is for `{}`", info.kind()),
            });
        }
        info.validate()
            .map_err(|reason| ConfigurationError::InvalidParameters {
                actor_type: actor_type.to_owned(),
                key: key.clone(),
                reason,
            })?;

        if seen_keys.contains(&key) {
            let err = if key.qualifier.is_none() {
                ConfigurationError::AmbiguousTrait {
                    actor_type: actor_type.to_owned(),
                    kind: key.kind,
                }
            } else {
                ConfigurationError::DuplicateTrait {
                    actor_type: actor_type.to_owned(),
                    key,
                }
            };
            return Err(err);
        }

        if let Some(&required) = key
            .kind
            .requires()
            .iter()
            .find(|required| !seen_kinds.contains(*required))
        {
            return Err(ConfigurationError::MissingRequirement {
                actor_type: actor_type.to_owned(),
                key,
                required,
            });
        }

        seen_keys.insert(key.clone());
        seen_kinds.insert(key.kind);
        validated.push(TraitDecl {
            key,
            info: Arc::new(info),
        });
    }
    Ok(validated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::traits::{AmmoPool, Health, Mobile, SeeksRepair};

    const RULES: &str = r"
actors:
  tank:
    traits:
      - Mobile: { speed: 2 }
      - Health: { max_hp: 80 }
      - SeeksRepair: { repair_buildings: [fix] }
      - AmmoPool@primary: { capacity: 4, reload_ticks: 2 }
      - AmmoPool@secondary: { capacity: 1 }
  fix:
    traits:
      - Health:
      - RepairBay: { hp_per_step: 5, interval_ticks: 3 }
      - RallyPoint:
";

    fn load_err(yaml: &str) -> ConfigurationError {
        TraitRegistry::from_yaml(yaml).unwrap_err()
    }

    #[test]
    fn loads_declarations_in_order() {
        let registry = TraitRegistry::from_yaml(RULES).unwrap();
        let keys: Vec<String> = registry
            .traits_for("tank")
            .unwrap()
            .iter()
            .map(|decl| decl.key.to_string())
            .collect();
        assert_eq!(
            keys,
            vec!["Mobile", "Health", "SeeksRepair", "AmmoPool@primary", "AmmoPool@secondary"]
        );
        assert_eq!(registry.actor_types().collect::<Vec<_>>(), vec!["fix", "tank"]);
    }

    #[test]
    fn create_instantiates_independent_state() {
        let registry = TraitRegistry::from_yaml(RULES).unwrap();
        let mut a = registry.create("tank").unwrap();
        let b = registry.create("tank").unwrap();

        assert!(a.get_qualified_mut::<AmmoPool>("primary").unwrap().state_mut().take_one());
        assert_eq!(a.get_qualified::<AmmoPool>("primary").unwrap().state().ammo(), 3);
        assert_eq!(b.get_qualified::<AmmoPool>("primary").unwrap().state().ammo(), 4);
        assert_eq!(b.get::<Health>().unwrap().state().hp(), 80);
        assert!(b.has::<Mobile>() && b.has::<SeeksRepair>());
    }

    #[test]
    fn unknown_actor_type_is_rejected() {
        let registry = TraitRegistry::from_yaml(RULES).unwrap();
        assert!(matches!(
            registry.create("dragon"),
            Err(ConfigurationError::UnknownActorType(name)) if name == "dragon"
        ));
    }

    #[test]
    fn unknown_trait_kind_is_rejected() {
        let err = load_err("actors: { a: { traits: [ { Teleporter: {} } ] } }");
        assert!(matches!(err, ConfigurationError::UnknownTrait { kind, .. } if kind == "Teleporter"));
    }

    #[test]
    fn malformed_key_is_rejected() {
        let err = load_err("actors: { a: { traits: [ { 'Mobile@': {} } ] } }");
        assert!(matches!(err, ConfigurationError::MalformedKey { .. }));
    }

    #[test]
    fn entry_with_two_keys_is_rejected() {
        let err = load_err("actors: { a: { traits: [ { Mobile: {}, Health: {} } ] } }");
        assert!(matches!(err, ConfigurationError::MalformedEntry { count: 2, .. }));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let err = load_err("actors: { a: { traits: [ { Mobile: { speed: fast } } ] } }");
        assert!(matches!(err, ConfigurationError::InvalidParameters { .. }));

        let err = load_err("actors: { a: { traits: [ { Mobile: { speed: 0 } } ] } }");
        assert!(matches!(err, ConfigurationError::InvalidParameters { reason, .. } if reason.contains("speed")));
    }

    #[test]
    fn duplicate_qualified_key_is_rejected() {
        let err = load_err(
            "actors: { a: { traits: [ { AmmoPool@x: {} }, { AmmoPool@x: {} } ] } }",
        );
        assert!(matches!(err, ConfigurationError::DuplicateTrait { .. }));
    }

    #[test]
    fn second_unqualified_instance_is_ambiguous() {
        let err = load_err("actors: { a: { traits: [ { Highlight: {} }, { Highlight: {} } ] } }");
        assert!(matches!(
            err,
            ConfigurationError::AmbiguousTrait { kind: TraitKind::Highlight, .. }
        ));
    }

    #[test]
    fn requirement_must_be_declared_first() {
        let err = load_err(
            r"
actors:
  a:
    traits:
      - Mobile:
      - SeeksRepair: { repair_buildings: [b] }
      - Health:
  b:
    traits:
      - RepairBay:
",
        );
        assert!(matches!(
            err,
            ConfigurationError::MissingRequirement { required: TraitKind::Health, .. }
        ));
    }

    #[test]
    fn repair_buildings_must_exist_and_repair() {
        let unknown = load_err(
            "actors: { a: { traits: [ { Mobile: }, { Health: }, { SeeksRepair: { repair_buildings: [nope] } } ] } }",
        );
        assert!(matches!(unknown, ConfigurationError::BadReference { referenced, .. } if referenced == "nope"));

        let no_bay = load_err(
            r"
actors:
  a:
    traits:
      - Mobile:
      - Health:
      - SeeksRepair: { repair_buildings: [b] }
  b:
    traits:
      - Health:
",
        );
        assert!(matches!(no_bay, ConfigurationError::BadReference { reason, .. } if reason.contains("RepairBay")));
    }

    #[test]
    fn produced_types_must_exist() {
        let err = load_err(
            "actors: { yard: { traits: [ { Production: { produces: [zeppelin] } } ] } }",
        );
        assert!(matches!(err, ConfigurationError::BadReference { referenced, .. } if referenced == "zeppelin"));

        let registry = TraitRegistry::from_yaml(
            "actors: { yard: { traits: [ { Production: { produces: [yard], build_ticks: 2 } } ] } }",
        )
        .unwrap();
        assert!(registry.contains("yard"));
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(matches!(load_err("actors: ["), ConfigurationError::Yaml { .. }));
    }

    #[test]
    fn load_project_rules_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(Path::parent)
            .map(|root| root.join("rules/skirmish-rules.yaml"));

        if let Some(rules_path) = path.filter(|p| p.exists()) {
            let registry = TraitRegistry::from_file(&rules_path).unwrap();
            assert!(registry.contains("tank"));
            assert!(registry.create("fix").unwrap().len() > 1);
        }
    }
}
