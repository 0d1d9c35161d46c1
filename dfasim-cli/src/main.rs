//! dfasim-cli - Command-line interface for dfasim
//!
//! Provides both a REPL and one-shot command execution.

mod commands;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use dfasim_player::{Config, Session};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dfasim-cli")]
#[command(about = "Build deterministic finite automata and watch them run")]
#[command(version)]
struct Cli {
    /// JSON definition file
    #[arg(short, long, env = "DFASIM_DEFINITION", conflicts_with = "preset")]
    definition: Option<PathBuf>,

    /// Built-in automaton (see `presets`)
    #[arg(short, long, env = "DFASIM_PRESET")]
    preset: Option<String>,

    /// Auto-play delay in milliseconds (100-1000)
    #[arg(short, long, env = "DFASIM_SPEED_MS")]
    speed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive REPL
    Repl,

    /// Auto-play a run, printing each step
    Run {
        /// Input string
        input: String,
    },

    /// Evaluate an input without animation
    Check {
        /// Input string
        input: String,
    },

    /// Print state positions as JSON
    Layout {
        /// Surface width
        #[arg(long)]
        width: Option<f64>,

        /// Surface height
        #[arg(long)]
        height: Option<f64>,
    },

    /// Print the definition as JSON
    Export,

    /// List built-in automata
    Presets,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.definition.is_some() || cli.preset.is_some() {
        config.definition.path = cli.definition;
        config.definition.preset = cli.preset;
    }
    if let Some(ms) = cli.speed {
        config.simulation.speed_ms = ms;
    }

    let mut session = match Session::from_config(&config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(session).await?;
        }
        Some(cmd) => match commands::execute(&mut session, cmd).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
