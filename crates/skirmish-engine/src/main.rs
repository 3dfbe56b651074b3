//! Headless engine binary for the Skirmish simulation.
//!
//! Runs a scripted scenario across several in-process peers in lockstep,
//! cross-checking their state hashes every hash tick, and optionally writes
//! a verified save game at the end.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skirmish-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load and validate the trait rules
//! 4. Load the scenario named on the command line
//! 5. Build one simulation replica per peer
//! 6. Run the lockstep loop until `max_ticks`
//! 7. Write and verify the save, if configured

mod error;
mod peer;
mod scenario;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use skirmish_core::config::{SEED_ENV_VAR, SimulationConfig};
use skirmish_core::save::SaveGame;
use skirmish_core::sync::SyncChecker;
use skirmish_core::traits::TraitRegistry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::scenario::Scenario;

/// Scenario used when none is given on the command line.
const DEFAULT_SCENARIO: &str = "scenarios/repair-demo.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step, a tick, or the save fails,
/// or if the peers desynchronize.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        seed = config.session.seed,
        order_latency = config.session.order_latency,
        max_ticks = config.session.max_ticks,
        hash_interval = config.session.hash_interval,
        "Configuration loaded"
    );

    // 3. Load rules.
    let registry = Arc::new(TraitRegistry::from_file(&config.rules.path)?);
    info!(actor_types = registry.actor_types().count(), "Rules loaded");

    // 4. Load scenario.
    let scenario_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_SCENARIO), PathBuf::from);
    let scenario = Scenario::from_file(&scenario_path)?;
    info!(
        name = scenario.name,
        players = scenario.players.len(),
        actors = scenario.actors.len(),
        scripted_orders = scenario.orders.len(),
        "Scenario loaded"
    );

    // 5. Build peers.
    let mut peers = peer::build(&config.session, &registry, &scenario)?;
    info!(peers = peers.len(), "Peers assembled, entering lockstep loop");

    // 6. Run.
    let mut checker = SyncChecker::new();
    let mut ticks_run: u64 = 0;
    while ticks_run < config.session.max_ticks {
        peer::exchange(&mut peers, &scenario)?;
        let mut advanced = false;
        for peer in &mut peers {
            let Some(summary) = peer.advance()? else {
                continue;
            };
            advanced = true;
            if let Some(hash) = summary.state_hash {
                checker.report(peer.host, summary.tick, hash)?;
            }
        }
        if !advanced {
            warn!(tick = ticks_run, "no peer could advance, stopping");
            break;
        }
        ticks_run = ticks_run.saturating_add(1);
        checker.forget_before(ticks_run.saturating_sub(1));
    }

    let Some(reference) = peers.first() else {
        return Ok(());
    };
    let final_hash = reference
        .sim
        .state_hash()
        .map_err(|source| EngineError::Tick {
            source: source.into(),
        })?;
    info!(
        ticks = reference.sim.tick(),
        actors_alive = reference.sim.world().len(),
        hash = final_hash,
        "Run complete, all peers in sync"
    );

    // 7. Save.
    if let Some(path) = &config.session.save_path {
        let save = SaveGame::capture(&reference.sim);
        save.write_to(path)?;
        SaveGame::read_from(path)?.verify(Arc::clone(&registry))?;
    }

    info!("skirmish-engine shutdown complete");
    Ok(())
}

/// Load the session configuration from `skirmish-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
/// Without one, defaults apply; `SKIRMISH_SEED` is honored either way.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new("skirmish-config.yaml");
    if config_path.exists() {
        return Ok(SimulationConfig::from_file(config_path)?);
    }
    let mut config = SimulationConfig::default();
    config
        .session
        .apply_seed_override(std::env::var(SEED_ENV_VAR).ok().as_deref())?;
    Ok(config)
}
