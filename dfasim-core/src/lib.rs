//! # dfasim-core
//!
//! Deterministic finite automaton simulator.
//!
//! This crate provides:
//! - Automaton definition editing, validation and JSON persistence
//! - A step-wise simulation engine with a reversible cursor
//! - Circular state layout
//! - Edge highlighting for the displayed step

pub mod definition;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod layout;
pub mod presets;
pub mod trace;

pub use definition::{parse_list, Automaton, AutomatonRaw, Evaluation, FillPolicy, State, Symbol};
pub use engine::{clamp_speed, SimulationEngine, StepTicket};
pub use error::{CoreError, DefinitionWarning};
pub use highlight::Edge;
pub use layout::{circle_layout, LayoutCache, Position, Surface};
pub use trace::{Configuration, Outcome, SimulationStatus, Snapshot};
