//! Scripted scenarios: the players, the starting map, and the orders each
//! player issues on which tick.
//!
//! ```yaml
//! name: repair-demo
//! players: [1, 2]
//! actors:
//!   - { actor_type: tank, owner: 1, position: { x: 0, y: 5 }, hp: 40 }
//! orders:
//!   - tick: 0
//!     player: 1
//!     order: { source: 1, verb: Enter, target_actor: 2 }
//! ```
//!
//! Order ticks are issue ticks; the lockstep barrier delays resolution by
//! the configured order latency.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use skirmish_core::ActorInit;
use skirmish_types::{Order, PlayerId};

use crate::error::EngineError;

/// One order a player issues on a given tick.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedOrder {
    /// The tick the order is issued on.
    pub tick: u64,
    /// The issuing player.
    pub player: PlayerId,
    /// The order itself.
    pub order: Order,
}

/// A complete scripted match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Display name for logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Participants, each hosted by one in-process peer.
    pub players: Vec<PlayerId>,

    /// The starting map, spawned in order.
    #[serde(default)]
    pub actors: Vec<ActorInit>,

    /// The script.
    #[serde(default)]
    pub orders: Vec<ScriptedOrder>,
}

fn default_name() -> String {
    String::from("unnamed")
}

impl Scenario {
    /// Load and check a scenario file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Scenario {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parse and check a scenario from YAML.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        let scenario: Self = serde_yml::from_str(yaml).map_err(|e| EngineError::Scenario {
            message: format!("failed to parse scenario YAML: {e}"),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.players.is_empty() {
            return Err(EngineError::Scenario {
                message: "scenario lists no players".to_owned(),
            });
        }
        let players: BTreeSet<PlayerId> = self.players.iter().copied().collect();
        if players.len() != self.players.len() {
            return Err(EngineError::Scenario {
                message: "scenario lists a player twice".to_owned(),
            });
        }
        if let Some(stray) = self
            .orders
            .iter()
            .find(|scripted| !players.contains(&scripted.player))
        {
            return Err(EngineError::Scenario {
                message: format!(
                    "order on tick {} comes from {}, who is not playing",
                    stray.tick, stray.player
                ),
            });
        }
        Ok(())
    }

    /// The orders `player` issues on `tick`, in script order.
    pub fn orders_for(&self, player: PlayerId, tick: u64) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|scripted| scripted.player == player && scripted.tick == tick)
            .map(|scripted| scripted.order.clone())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::{ActorId, WorldPos, verbs};

    const DEMO: &str = r"
name: demo
players: [1, 2]
actors:
  - { actor_type: tank, owner: 1, position: { x: 0, y: 5 }, hp: 40 }
orders:
  - { tick: 0, player: 1, order: { source: 1, verb: Enter, target_actor: 2 } }
  - { tick: 0, player: 1, order: { source: 3, verb: Stop } }
  - { tick: 3, player: 2, order: { source: 4, verb: Demolish } }
";

    #[test]
    fn parses_players_map_and_script() {
        let scenario = Scenario::parse(DEMO).unwrap();
        assert_eq!(scenario.name, "demo");
        assert_eq!(scenario.players, vec![PlayerId::new(1), PlayerId::new(2)]);
        let tank = scenario.actors.first().unwrap();
        assert_eq!(tank.position, WorldPos::new(0, 5));
        assert_eq!(tank.hp, Some(40));

        let orders = scenario.orders_for(PlayerId::new(1), 0);
        assert_eq!(orders.len(), 2);
        let enter = orders.first().unwrap();
        assert_eq!(enter.verb(), verbs::ENTER);
        assert_eq!(enter.target_actor(), Some(ActorId::new(2)));
        assert!(scenario.orders_for(PlayerId::new(2), 0).is_empty());
    }

    #[test]
    fn order_from_non_player_is_rejected() {
        let yaml = r"
players: [1]
orders:
  - { tick: 0, player: 5, order: { source: 1, verb: Stop } }
";
        assert!(matches!(Scenario::parse(yaml), Err(EngineError::Scenario { .. })));
    }

    #[test]
    fn empty_player_list_is_rejected() {
        assert!(Scenario::parse("players: []").is_err());
    }
}
