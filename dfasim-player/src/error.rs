//! Player error types.

use crate::config::ConfigError;
use dfasim_core::CoreError;
use thiserror::Error;

/// Player errors.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no simulation in progress")]
    NotRunning,
}

impl PlayerError {
    /// Returns an error code suitable for user-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            PlayerError::Core(e) => e.error_code(),
            PlayerError::Io(_) => "IO_ERROR",
            PlayerError::Config(_) => "CONFIG_ERROR",
            PlayerError::NotRunning => "NOT_RUNNING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PlayerError::from(CoreError::EmptyInput).error_code(),
            "EMPTY_INPUT"
        );
        assert_eq!(PlayerError::NotRunning.error_code(), "NOT_RUNNING");
        assert_eq!(
            PlayerError::from(ConfigError::ValidationError("x".to_string())).error_code(),
            "CONFIG_ERROR"
        );
    }
}
