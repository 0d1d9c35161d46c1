//! dfasim - Deterministic finite automaton simulator
//!
//! Headless batch runner: loads the configured automaton and auto-plays each
//! configured input, logging every step and the verdict.

use dfasim_core::{Outcome, SimulationStatus};
use dfasim_player::{Config, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("DFASIM_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration error: {}", e);
        return Err(e.into());
    }

    let mut session = Session::from_config(&config)?;
    session.set_autoplay(true);

    tracing::info!("Starting dfasim");
    tracing::info!(
        "  Automaton: {} states, {} symbols, checksum {}",
        session.automaton().states().len(),
        session.automaton().alphabet().len(),
        session.automaton().checksum()
    );
    tracing::info!("  Speed: {} ms", config.simulation.speed().as_millis());

    if config.run.inputs.is_empty() {
        tracing::warn!("No inputs configured (set run.inputs or DFASIM_INPUTS)");
        return Ok(());
    }

    let mut accepted = 0usize;
    for input in &config.run.inputs {
        if let Err(e) = session.test(input) {
            tracing::error!("Cannot test {:?}: {}", input, e);
            continue;
        }

        let snapshot = tokio::select! {
            snapshot = session.player().finished() => snapshot,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping simulation");
                session.player().stop();
                break;
            }
        };

        if snapshot.status == SimulationStatus::Completed {
            if snapshot.outcome == Outcome::Accepted {
                accepted += 1;
            }
            tracing::info!("{:?}: {}", input, snapshot.outcome);
        }
    }

    tracing::info!(
        "{} of {} inputs accepted",
        accepted,
        config.run.inputs.len()
    );

    Ok(())
}
