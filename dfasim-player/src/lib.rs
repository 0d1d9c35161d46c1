//! # dfasim-player
//!
//! Timed auto-play and editing sessions for dfasim.
//!
//! This crate provides:
//! - A player that steps a simulation on a cancellable tokio timer
//! - Editing sessions with the "test" action
//! - Layered YAML/environment configuration

pub mod config;
pub mod error;
pub mod player;
pub mod session;

pub use config::{Config, ConfigError};
pub use error::PlayerError;
pub use player::Player;
pub use session::{load_automaton, read_definition, Frame, Session};
