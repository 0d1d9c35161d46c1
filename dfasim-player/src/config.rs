//! Simulator configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via DFASIM_CONFIG)
//! 3. Environment variables

use dfasim_core::engine::{clamp_speed, DEFAULT_SPEED_MS};
use dfasim_core::{parse_list, FillPolicy, Surface};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Auto-play and editing behaviour.
    pub simulation: SimulationConfig,
    /// Drawing surface used for layout.
    pub layout: LayoutConfig,
    /// Where the automaton comes from.
    pub definition: DefinitionConfig,
    /// Inputs for the batch runner.
    pub run: RunConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DFASIM_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.simulation.apply_env_overrides();
        self.layout.apply_env_overrides();
        self.definition.apply_env_overrides();
        self.run.apply_env_overrides();
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.definition.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between auto-played steps in milliseconds.
    pub speed_ms: u64,
    /// Target for transition cells created by edits.
    pub fill_policy: FillPolicy,
    /// Start auto-play as soon as a test run begins.
    pub autoplay: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed_ms: DEFAULT_SPEED_MS,
            fill_policy: FillPolicy::FirstState,
            autoplay: true,
        }
    }
}

impl SimulationConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(speed) = std::env::var("DFASIM_SPEED_MS") {
            if let Ok(ms) = speed.parse() {
                self.speed_ms = ms;
            }
        }

        if let Ok(policy) = std::env::var("DFASIM_FILL_POLICY") {
            self.fill_policy = match policy.to_lowercase().as_str() {
                "self_loop" | "selfloop" => FillPolicy::SelfLoop,
                _ => FillPolicy::FirstState,
            };
        }

        if let Ok(autoplay) = std::env::var("DFASIM_AUTOPLAY") {
            self.autoplay = autoplay == "1" || autoplay.to_lowercase() == "true";
        }
    }

    /// Returns the auto-play delay, clamped to the speed control's range.
    pub fn speed(&self) -> Duration {
        clamp_speed(self.speed_ms)
    }
}

/// Layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl LayoutConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(width) = std::env::var("DFASIM_LAYOUT_WIDTH") {
            if let Ok(w) = width.parse() {
                self.width = w;
            }
        }
        if let Ok(height) = std::env::var("DFASIM_LAYOUT_HEIGHT") {
            if let Ok(h) = height.parse() {
                self.height = h;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "layout surface must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Returns the configured drawing surface.
    pub fn surface(&self) -> Surface {
        Surface::new(self.width, self.height)
    }
}

/// Definition source configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionConfig {
    /// JSON definition file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Name of a built-in automaton.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl DefinitionConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DFASIM_DEFINITION") {
            self.path = Some(PathBuf::from(path));
        }
        if let Ok(preset) = std::env::var("DFASIM_PRESET") {
            self.preset = Some(preset);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_some() && self.preset.is_some() {
            return Err(ConfigError::ValidationError(
                "definition.path and definition.preset are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Batch run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Input strings to simulate in order.
    pub inputs: Vec<String>,
}

impl RunConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(inputs) = std::env::var("DFASIM_INPUTS") {
            self.inputs = parse_list(&inputs);
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.simulation.speed(), Duration::from_millis(500));
        assert_eq!(config.simulation.fill_policy, FillPolicy::FirstState);
        assert!(config.simulation.autoplay);
        assert_eq!(config.layout.surface(), Surface::new(800.0, 600.0));
        assert!(config.definition.path.is_none());
        assert!(config.run.inputs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut config = SimulationConfig::default();
        config.speed_ms = 20;
        assert_eq!(config.speed(), Duration::from_millis(100));
        config.speed_ms = 4000;
        assert_eq!(config.speed(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
simulation:
  speed_ms: 200
  fill_policy: self_loop
run:
  inputs: ["1010", "11"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.simulation.speed_ms, 200);
        assert_eq!(config.simulation.fill_policy, FillPolicy::SelfLoop);
        assert!(config.simulation.autoplay);
        assert_eq!(config.layout.width, 800.0);
        assert_eq!(config.run.inputs, vec!["1010", "11"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dfasim.yaml");

        let mut config = Config::default();
        config.definition.preset = Some("even-ones".to_string());
        config.layout.width = 1024.0;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn test_bad_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "simulation: [not, a, map]").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(..))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.layout.height = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.definition.path = Some(PathBuf::from("dfa.json"));
        config.definition.preset = Some("default".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
