//! Core error types.

use thiserror::Error;

/// Errors from the automaton model and simulation engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("input string is empty")]
    EmptyInput,

    #[error("state not found: {state}")]
    UnknownState { state: String },

    #[error("symbol not in alphabet: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("invalid automaton definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns an error code suitable for user-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::EmptyInput => "EMPTY_INPUT",
            CoreError::UnknownState { .. } => "UNKNOWN_STATE",
            CoreError::UnknownSymbol { .. } => "UNKNOWN_SYMBOL",
            CoreError::InvalidDefinition { .. } => "BAD_DEFINITION",
            CoreError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            CoreError::Json(_) => "BAD_DEFINITION",
        }
    }
}

/// A definition inconsistency that edits tolerate but report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionWarning {
    #[error("initial state '{state}' is not declared")]
    InitialNotDeclared { state: String },

    #[error("automaton has no states")]
    NoStates,

    #[error("accepting state '{state}' is not declared")]
    AcceptingNotDeclared { state: String },

    #[error("missing transition from '{state}' on '{symbol}'")]
    MissingTransition { state: String, symbol: String },

    #[error("transition from '{state}' on '{symbol}' targets undeclared state '{target}'")]
    DanglingTarget {
        state: String,
        symbol: String,
        target: String,
    },

    #[error("duplicate entry '{entry}' ignored")]
    DuplicateEntry { entry: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::EmptyInput.error_code(), "EMPTY_INPUT");
        assert_eq!(
            CoreError::UnknownState {
                state: "q9".to_string()
            }
            .error_code(),
            "UNKNOWN_STATE"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = DefinitionWarning::MissingTransition {
            state: "q0".to_string(),
            symbol: "1".to_string(),
        };
        assert_eq!(warning.to_string(), "missing transition from 'q0' on '1'");
    }
}
