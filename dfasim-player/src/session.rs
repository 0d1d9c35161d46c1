//! Editing session.
//!
//! A [`Session`] holds the automaton being edited alongside the player that
//! simulates it. Edits never touch a run in progress: the player keeps the
//! definition it was started with until the next test run pushes a fresh copy.

use crate::config::Config;
use crate::error::PlayerError;
use crate::player::Player;
use dfasim_core::highlight::traversed_edges;
use dfasim_core::{
    presets, Automaton, CoreError, Edge, FillPolicy, LayoutCache, Position, SimulationStatus,
    Snapshot, State, Surface,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// States drawn, in declaration order.
    pub states: Vec<State>,
    /// Surface the positions were computed for.
    pub surface: Surface,
    /// Position of every state.
    pub positions: HashMap<State, Position>,
    /// Simulation state at the cursor.
    pub snapshot: Snapshot,
    /// Every edge taken up to the cursor.
    pub traversed: Vec<Edge>,
}

/// An editable automaton and its simulation.
pub struct Session {
    automaton: Automaton,
    player: Player,
    /// Checksum of the definition the player holds.
    loaded_checksum: String,
    autoplay: bool,
    surface: Surface,
    layout: LayoutCache,
}

impl Session {
    /// Creates a session around `automaton`.
    pub fn new(automaton: Automaton, config: &Config) -> Result<Self, PlayerError> {
        let loaded_checksum = automaton.checksum();
        let player = Player::new(Arc::new(automaton.clone()), config.simulation.speed())?;

        Ok(Self {
            automaton,
            player,
            loaded_checksum,
            autoplay: config.simulation.autoplay,
            surface: config.layout.surface(),
            layout: LayoutCache::new(),
        })
    }

    /// Creates a session for the automaton named by `config.definition`.
    pub fn from_config(config: &Config) -> Result<Self, PlayerError> {
        let automaton = load_automaton(config)?;
        Self::new(automaton, config)
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    /// Applies an edit to the automaton.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Automaton) -> R) -> R {
        let result = f(&mut self.automaton);
        if self.is_stale() {
            tracing::debug!("Definition edited; changes apply to the next run");
        }
        result
    }

    /// Replaces the automaton with a built-in one and stops any run.
    pub fn load_preset(&mut self, name: &str) -> Result<(), PlayerError> {
        let mut automaton = presets::preset(name)?;
        automaton.set_fill_policy(self.automaton.fill_policy());
        self.replace(automaton)
    }

    /// Replaces the automaton with one read from a JSON file and stops any run.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), PlayerError> {
        let automaton = read_definition(path.as_ref(), self.automaton.fill_policy())?;
        self.replace(automaton)
    }

    /// Returns true if the definition changed since the player last loaded it.
    pub fn is_stale(&self) -> bool {
        self.automaton.checksum() != self.loaded_checksum
    }

    /// Runs the "test" action: simulates `input` against the current
    /// definition.
    pub fn test(&mut self, input: &str) -> Result<Snapshot, PlayerError> {
        if input.is_empty() {
            return Err(CoreError::EmptyInput.into());
        }

        if self.is_stale() {
            self.sync()?;
        }

        tracing::info!("Testing {:?} (checksum {})", input, self.loaded_checksum);
        Ok(self.player.start(input, self.autoplay))
    }

    /// Sets the layout surface.
    pub fn resize(&mut self, surface: Surface) {
        self.surface = surface;
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Builds the current frame.
    ///
    /// While a run is active the layout follows the simulated automaton;
    /// otherwise it follows the definition being edited.
    pub fn frame(&mut self) -> Frame {
        let (snapshot, traversed, simulated) = self.player.with_engine(|engine| {
            (
                engine.snapshot(),
                traversed_edges(engine.trace(), engine.cursor()),
                Arc::clone(engine.automaton()),
            )
        });

        let states = if snapshot.status == SimulationStatus::Idle {
            self.automaton.states()
        } else {
            simulated.states()
        };
        let positions = self.layout.positions(states, self.surface).clone();

        Frame {
            states: states.to_vec(),
            surface: self.surface,
            positions,
            snapshot,
            traversed,
        }
    }

    fn replace(&mut self, automaton: Automaton) -> Result<(), PlayerError> {
        automaton.ensure_valid()?;
        self.automaton = automaton;
        self.sync()
    }

    fn sync(&mut self) -> Result<(), PlayerError> {
        self.player.reload(Arc::new(self.automaton.clone()))?;
        self.loaded_checksum = self.automaton.checksum();
        Ok(())
    }
}

/// Loads the automaton `config.definition` names, or the default example.
pub fn load_automaton(config: &Config) -> Result<Automaton, PlayerError> {
    config.validate()?;
    let policy = config.simulation.fill_policy;

    let automaton = match (&config.definition.path, &config.definition.preset) {
        (Some(path), _) => read_definition(path, policy)?,
        (None, Some(name)) => {
            let mut automaton = presets::preset(name)?;
            automaton.set_fill_policy(policy);
            automaton
        }
        (None, None) => {
            let mut automaton = Automaton::default();
            automaton.set_fill_policy(policy);
            automaton
        }
    };

    Ok(automaton)
}

/// Reads a JSON definition file.
pub fn read_definition(path: &Path, policy: FillPolicy) -> Result<Automaton, PlayerError> {
    let text = std::fs::read_to_string(path)?;
    let automaton = Automaton::from_json_str(&text, policy)?;
    tracing::info!(
        "Loaded automaton from {} ({} states, {} symbols)",
        path.display(),
        automaton.states().len(),
        automaton.alphabet().len()
    );
    Ok(automaton)
}
