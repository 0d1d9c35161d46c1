//! Simulation trace types.

use crate::definition::{State, Symbol};
use crate::highlight::Edge;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One snapshot of the automaton while it reads its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// State reached after `consumed`.
    pub state: State,

    /// Input read so far.
    pub consumed: String,

    /// Input not read yet.
    pub remaining: String,

    /// Number of symbols consumed; equals the index in the trace.
    pub step_index: usize,

    /// Symbol consumed to reach this configuration (`None` for step 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Symbol>,
}

impl Configuration {
    /// The configuration every run starts from.
    pub fn initial(state: State, input: impl Into<String>) -> Self {
        Self {
            state,
            consumed: String::new(),
            remaining: input.into(),
            step_index: 0,
            via: None,
        }
    }

    /// Consumes `symbol` from the front of `remaining` and moves to `next`.
    ///
    /// The caller guarantees `remaining` starts with `symbol`.
    pub fn advance(&self, symbol: &Symbol, next: State) -> Self {
        let mut consumed = String::with_capacity(self.consumed.len() + symbol.len());
        consumed.push_str(&self.consumed);
        consumed.push_str(symbol.as_str());

        Self {
            state: next,
            consumed,
            remaining: self.remaining[symbol.len()..].to_string(),
            step_index: self.step_index + 1,
            via: Some(symbol.clone()),
        }
    }
}

/// Verdict of a run, relative to the current cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "symbol", rename_all = "snake_case")]
pub enum Outcome {
    /// No verdict yet.
    #[default]
    Pending,
    /// Input exhausted in an accepting state.
    Accepted,
    /// Input exhausted in a non-accepting state.
    Rejected,
    /// Input contained a symbol outside the alphabet.
    SymbolError(String),
}

impl Outcome {
    /// Returns true for any verdict other than `Pending`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => f.write_str("pending"),
            Outcome::Accepted => f.write_str("accepted"),
            Outcome::Rejected => f.write_str("rejected"),
            Outcome::SymbolError(symbol) => write!(f, "symbol '{}' is not in the alphabet", symbol),
        }
    }
}

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    /// No run in progress.
    #[default]
    Idle,
    /// Auto-play may advance the run.
    Running,
    /// Run halted by the user; manual stepping still works.
    Paused,
    /// A verdict was reached at the cursor.
    Completed,
}

/// What a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: SimulationStatus,
    pub outcome: Outcome,
    pub cursor: usize,
    pub trace_len: usize,
    /// Configuration at the cursor (`None` when idle).
    pub current: Option<Configuration>,
    /// Edge taken by the step at the cursor.
    pub active_edge: Option<Edge>,
}

impl Snapshot {
    /// Returns the highlighted state, if any.
    pub fn current_state(&self) -> Option<&State> {
        self.current.as_ref().map(|c| &c.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_configuration() {
        let config = Configuration::initial(State::from("q0"), "1010");
        assert_eq!(config.step_index, 0);
        assert_eq!(config.consumed, "");
        assert_eq!(config.remaining, "1010");
        assert!(config.via.is_none());
    }

    #[test]
    fn test_advance() {
        let config = Configuration::initial(State::from("q0"), "ab1");
        let next = config.advance(&Symbol::from("ab"), State::from("q1"));

        assert_eq!(next.state.as_str(), "q1");
        assert_eq!(next.consumed, "ab");
        assert_eq!(next.remaining, "1");
        assert_eq!(next.step_index, 1);
        assert_eq!(next.via, Some(Symbol::from("ab")));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Accepted.to_string(), "accepted");
        assert_eq!(
            Outcome::SymbolError("2".to_string()).to_string(),
            "symbol '2' is not in the alphabet"
        );
        assert!(!Outcome::Pending.is_terminal());
        assert!(Outcome::Rejected.is_terminal());
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_value(Outcome::SymbolError("x".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "symbol_error", "symbol": "x"}));

        let json = serde_json::to_value(Outcome::Accepted).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "accepted"}));
    }
}
