//! Simulation engine - walks an input through an automaton with a
//! reversible cursor over the resulting trace.

use crate::definition::{Automaton, SymbolMatch};
use crate::error::CoreError;
use crate::highlight;
use crate::trace::{Configuration, Outcome, SimulationStatus, Snapshot};
use std::sync::Arc;
use std::time::Duration;

/// Default delay between auto-played steps.
pub const DEFAULT_SPEED_MS: u64 = 500;
/// Fastest auto-play delay a control may select.
pub const MIN_SPEED_MS: u64 = 100;
/// Slowest auto-play delay a control may select.
pub const MAX_SPEED_MS: u64 = 1000;
/// Granularity of the speed control.
pub const SPEED_INCREMENT_MS: u64 = 100;

/// Clamps a requested delay to the speed control's range and increments.
pub fn clamp_speed(ms: u64) -> Duration {
    let clamped = ms.clamp(MIN_SPEED_MS, MAX_SPEED_MS);
    let rounded = (clamped + SPEED_INCREMENT_MS / 2) / SPEED_INCREMENT_MS * SPEED_INCREMENT_MS;
    Duration::from_millis(rounded.clamp(MIN_SPEED_MS, MAX_SPEED_MS))
}

/// Permission for one scheduled step.
///
/// A ticket goes stale as soon as the run is paused, resumed, rewound,
/// stopped or restarted, so a timer that fires late cannot advance a run the
/// user has since changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTicket {
    generation: u64,
}

/// The simulation engine.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    /// Definition the current run reads.
    automaton: Arc<Automaton>,

    /// Every configuration computed so far. Rewinding never truncates it.
    trace: Vec<Configuration>,

    /// Index of the displayed configuration.
    cursor: usize,

    outcome: Outcome,

    status: SimulationStatus,

    /// Delay between auto-played steps.
    speed: Duration,

    /// Bumped by every operation that invalidates scheduled steps.
    generation: u64,
}

impl SimulationEngine {
    /// Creates an idle engine for a valid automaton.
    pub fn new(automaton: Arc<Automaton>) -> Result<Self, CoreError> {
        automaton.ensure_valid()?;

        Ok(Self {
            automaton,
            trace: Vec::new(),
            cursor: 0,
            outcome: Outcome::Pending,
            status: SimulationStatus::Idle,
            speed: Duration::from_millis(DEFAULT_SPEED_MS),
            generation: 0,
        })
    }

    /// Replaces the automaton. Any run in progress is stopped.
    pub fn reload(&mut self, automaton: Arc<Automaton>) -> Result<(), CoreError> {
        automaton.ensure_valid()?;
        self.stop();
        self.automaton = automaton;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    pub fn trace(&self) -> &[Configuration] {
        &self.trace
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn speed(&self) -> Duration {
        self.speed
    }

    /// Configuration under the cursor.
    pub fn current(&self) -> Option<&Configuration> {
        self.trace.get(self.cursor)
    }

    /// Returns what a renderer needs to draw the current frame.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            outcome: self.outcome.clone(),
            cursor: self.cursor,
            trace_len: self.trace.len(),
            current: self.current().cloned(),
            active_edge: highlight::active_edge(&self.trace, self.cursor),
        }
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Starts a fresh run over `input`.
    ///
    /// An empty input completes immediately.
    pub fn start(&mut self, input: &str) {
        self.generation += 1;
        self.trace = vec![Configuration::initial(
            self.automaton.initial_state().clone(),
            input,
        )];
        self.cursor = 0;
        self.outcome = Outcome::Pending;
        self.status = SimulationStatus::Running;

        tracing::info!(
            "Simulation started from '{}' on {:?}",
            self.automaton.initial_state(),
            input
        );

        if input.is_empty() {
            self.advance();
        }
    }

    /// Auto-play step. Does nothing unless the run is `Running`.
    ///
    /// Returns true if the cursor moved or a verdict was reached.
    pub fn step(&mut self) -> bool {
        if self.status != SimulationStatus::Running {
            return false;
        }
        self.advance()
    }

    /// Manual step. Works while running or paused; reuses the cached trace
    /// when the cursor is behind the frontier.
    pub fn step_forward(&mut self) -> bool {
        match self.status {
            SimulationStatus::Running | SimulationStatus::Paused => self.advance(),
            SimulationStatus::Idle | SimulationStatus::Completed => false,
        }
    }

    /// Moves the cursor back one configuration.
    ///
    /// The trace is kept, the verdict is cleared, and a running or completed
    /// run becomes paused.
    pub fn step_back(&mut self) -> bool {
        if self.status == SimulationStatus::Idle || self.cursor == 0 {
            return false;
        }

        self.generation += 1;
        self.cursor -= 1;
        self.outcome = Outcome::Pending;
        self.status = SimulationStatus::Paused;

        tracing::debug!("Rewound to step {}", self.cursor);
        true
    }

    /// Halts auto-play.
    pub fn pause(&mut self) -> bool {
        if self.status != SimulationStatus::Running {
            return false;
        }
        self.generation += 1;
        self.status = SimulationStatus::Paused;
        true
    }

    /// Lets auto-play continue.
    pub fn resume(&mut self) -> bool {
        if self.status != SimulationStatus::Paused {
            return false;
        }
        self.generation += 1;
        self.status = SimulationStatus::Running;
        true
    }

    /// Discards the run and returns to idle.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.trace.clear();
        self.cursor = 0;
        self.outcome = Outcome::Pending;
        self.status = SimulationStatus::Idle;
    }

    /// Sets the auto-play delay. Range checks belong to the control.
    pub fn set_speed(&mut self, speed: Duration) {
        self.speed = speed;
    }

    /// Issues a ticket for the next scheduled step, if auto-play may advance.
    pub fn ticket(&self) -> Option<StepTicket> {
        (self.status == SimulationStatus::Running).then_some(StepTicket {
            generation: self.generation,
        })
    }

    /// Performs a scheduled step if `ticket` is still current.
    pub fn step_scheduled(&mut self, ticket: StepTicket) -> bool {
        if ticket.generation != self.generation {
            tracing::warn!("Ignoring stale scheduled step");
            return false;
        }
        self.step()
    }

    /// Steps until a verdict is reached and returns it.
    pub fn run_to_completion(&mut self) -> &Outcome {
        while self.step_forward() && self.status != SimulationStatus::Completed {}
        &self.outcome
    }

    /// Moves the cursor forward one configuration, computing it if needed,
    /// or records the verdict when the input is exhausted or invalid.
    fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.trace.len() {
            self.cursor += 1;
            return true;
        }

        let Some(current) = self.trace.get(self.cursor) else {
            return false;
        };

        match self.automaton.match_symbol(&current.remaining) {
            SymbolMatch::End => {
                self.outcome = if self.automaton.is_accepting(&current.state) {
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                };
                self.status = SimulationStatus::Completed;
                tracing::info!(
                    "Simulation {} in '{}' after {} steps",
                    self.outcome,
                    current.state,
                    current.step_index
                );
            }
            SymbolMatch::Unknown(symbol) => {
                self.outcome = Outcome::SymbolError(symbol.to_string());
                self.status = SimulationStatus::Completed;
                tracing::info!(
                    "Simulation halted at step {}: {}",
                    current.step_index,
                    self.outcome
                );
            }
            SymbolMatch::Known(symbol) => {
                let next_state = self.automaton.next_state(&current.state, symbol).clone();
                tracing::debug!(
                    "Step {}: {} --{}--> {}",
                    current.step_index + 1,
                    current.state,
                    symbol,
                    next_state
                );
                let next = current.advance(symbol, next_state);
                self.trace.push(next);
                self.cursor = self.trace.len() - 1;
            }
        }

        true
    }
}
