//! Auto-play driver.
//!
//! A [`Player`] owns one [`SimulationEngine`] and, while a run is playing, one
//! timer task that sleeps for the engine's speed and then performs a single
//! scheduled step. Pausing, rewinding or stopping aborts the task outright;
//! the engine's step tickets catch any tick that was already in flight.

use crate::error::PlayerError;
use dfasim_core::engine::clamp_speed;
use dfasim_core::{Automaton, SimulationEngine, SimulationStatus, Snapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Drives a simulation engine on a timer and publishes its snapshots.
pub struct Player {
    engine: Arc<Mutex<SimulationEngine>>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Creates an idle player for `automaton`.
    pub fn new(automaton: Arc<Automaton>, speed: Duration) -> Result<Self, PlayerError> {
        let mut engine = SimulationEngine::new(automaton)?;
        engine.set_speed(speed);
        let (snapshots, _) = watch::channel(engine.snapshot());

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            snapshots: Arc::new(snapshots),
            timer: Mutex::new(None),
        })
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.engine.lock().snapshot()
    }

    /// Runs `f` against the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&SimulationEngine) -> R) -> R {
        f(&self.engine.lock())
    }

    /// Returns the automaton being simulated.
    pub fn automaton(&self) -> Arc<Automaton> {
        Arc::clone(self.engine.lock().automaton())
    }

    /// Returns true while a timer task is scheduled.
    pub fn is_playing(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Starts a run over `input`, auto-playing it if `autoplay` is set.
    pub fn start(&self, input: &str, autoplay: bool) -> Snapshot {
        self.cancel_timer();
        let snapshot = self.update(|engine| {
            engine.start(input);
            if !autoplay {
                engine.pause();
            }
        });
        if snapshot.status == SimulationStatus::Running {
            self.schedule();
        }
        snapshot
    }

    /// Resumes auto-play of a paused run.
    pub fn resume(&self) -> Result<Snapshot, PlayerError> {
        let mut resumed = false;
        let snapshot = self.update(|engine| resumed = engine.resume());
        if !resumed {
            return Err(PlayerError::NotRunning);
        }
        self.schedule();
        Ok(snapshot)
    }

    /// Halts auto-play.
    pub fn pause(&self) -> Snapshot {
        self.cancel_timer();
        self.update(|engine| {
            engine.pause();
        })
    }

    /// Performs one manual step.
    ///
    /// While auto-play is running the next scheduled step is pushed back a
    /// full delay from this one.
    pub fn step_forward(&self) -> Result<Snapshot, PlayerError> {
        let mut moved = false;
        let snapshot = self.update(|engine| moved = engine.step_forward());
        if !moved {
            return Err(PlayerError::NotRunning);
        }
        if snapshot.status == SimulationStatus::Running {
            self.schedule();
        } else {
            self.cancel_timer();
        }
        Ok(snapshot)
    }

    /// Rewinds one step and pauses.
    pub fn step_back(&self) -> Result<Snapshot, PlayerError> {
        self.cancel_timer();
        let mut moved = false;
        let snapshot = self.update(|engine| moved = engine.step_back());
        if !moved {
            return Err(PlayerError::NotRunning);
        }
        Ok(snapshot)
    }

    /// Discards the run.
    pub fn stop(&self) -> Snapshot {
        self.cancel_timer();
        self.update(SimulationEngine::stop)
    }

    /// Sets the auto-play delay, clamped to the speed control's range.
    ///
    /// A playing run picks the new delay up on its next tick.
    pub fn set_speed(&self, ms: u64) -> Duration {
        let speed = clamp_speed(ms);
        self.engine.lock().set_speed(speed);
        speed
    }

    /// Replaces the automaton, stopping any run in progress.
    pub fn reload(&self, automaton: Arc<Automaton>) -> Result<(), PlayerError> {
        self.cancel_timer();
        let mut engine = self.engine.lock();
        engine.reload(automaton)?;
        self.snapshots.send_replace(engine.snapshot());
        Ok(())
    }

    /// Waits until the run reaches a verdict or is stopped.
    pub async fn finished(&self) -> Snapshot {
        let mut rx = self.subscribe();
        let result = rx
            .wait_for(|s| {
                matches!(
                    s.status,
                    SimulationStatus::Completed | SimulationStatus::Idle
                )
            })
            .await
            .map(|s| s.clone());
        match result {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }

    /// Applies `f` to the engine and publishes the resulting snapshot.
    fn update(&self, f: impl FnOnce(&mut SimulationEngine)) -> Snapshot {
        let mut engine = self.engine.lock();
        f(&mut engine);
        let snapshot = engine.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }

    fn schedule(&self) {
        self.cancel_timer();

        let engine = Arc::clone(&self.engine);
        let snapshots = Arc::clone(&self.snapshots);
        let handle = tokio::spawn(async move {
            loop {
                let next = {
                    let engine = engine.lock();
                    engine.ticket().map(|ticket| (ticket, engine.speed()))
                };
                let Some((ticket, speed)) = next else {
                    break;
                };

                tokio::time::sleep(speed).await;

                let done = {
                    let mut engine = engine.lock();
                    if !engine.step_scheduled(ticket) {
                        true
                    } else {
                        snapshots.send_replace(engine.snapshot());
                        engine.status() != SimulationStatus::Running
                    }
                };
                if done {
                    break;
                }
            }
            tracing::debug!("Auto-play timer finished");
        });

        *self.timer.lock() = Some(handle);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfasim_core::{Outcome, State};

    fn test_player() -> Player {
        Player::new(Arc::new(Automaton::default()), Duration::from_millis(500)).unwrap()
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_reaches_verdict() {
        let player = test_player();
        player.start("1011", true);

        let snapshot = player.finished().await;
        assert_eq!(snapshot.status, SimulationStatus::Completed);
        assert_eq!(snapshot.outcome, Outcome::Accepted);
        assert_eq!(snapshot.cursor, 4);
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_spacing() {
        let player = test_player();
        player.start("1010", true);

        advance(250).await;
        assert_eq!(player.snapshot().cursor, 0);
        advance(500).await;
        assert_eq!(player.snapshot().cursor, 1);
        advance(500).await;
        assert_eq!(player.snapshot().cursor, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_pending_step() {
        let player = test_player();
        player.start("1010", true);

        advance(750).await;
        assert_eq!(player.snapshot().cursor, 1);

        player.pause();
        assert!(!player.is_playing());
        advance(5000).await;

        let snapshot = player.snapshot();
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.status, SimulationStatus::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_back_cancels_autoplay() {
        let player = test_player();
        player.start("1010", true);
        advance(1250).await;
        assert_eq!(player.snapshot().cursor, 2);

        let snapshot = player.step_back().unwrap();
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.status, SimulationStatus::Paused);

        advance(5000).await;
        assert_eq!(player.snapshot().cursor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_autoplay() {
        let player = test_player();
        player.start("1010", true);
        advance(750).await;

        let snapshot = player.stop();
        assert_eq!(snapshot.status, SimulationStatus::Idle);
        advance(5000).await;
        assert_eq!(player.snapshot().trace_len, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_continues() {
        let player = test_player();
        player.start("11", true);
        advance(750).await;
        player.pause();

        player.resume().unwrap();
        let snapshot = player.finished().await;
        assert_eq!(snapshot.outcome, Outcome::Rejected);
        assert_eq!(snapshot.current_state(), Some(&State::from("q0")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_stepping() {
        let player = test_player();
        let snapshot = player.start("10", false);
        assert_eq!(snapshot.status, SimulationStatus::Paused);
        assert!(!player.is_playing());

        player.step_forward().unwrap();
        let snapshot = player.step_forward().unwrap();
        assert_eq!(snapshot.cursor, 2);

        let snapshot = player.step_forward().unwrap();
        assert_eq!(snapshot.outcome, Outcome::Accepted);
        assert!(matches!(
            player.step_forward(),
            Err(PlayerError::NotRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_step_restarts_autoplay_delay() {
        let player = test_player();
        player.start("1011", true);

        advance(450).await;
        assert_eq!(player.snapshot().cursor, 0);
        let snapshot = player.step_forward().unwrap();
        assert_eq!(snapshot.cursor, 1);
        assert!(player.is_playing());

        advance(60).await;
        assert_eq!(player.snapshot().cursor, 1);
        advance(450).await;
        assert_eq!(player.snapshot().cursor, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_step_to_verdict_stops_timer() {
        let player = test_player();
        player.start("1", true);

        let snapshot = player.step_forward().unwrap();
        assert_eq!(snapshot.status, SimulationStatus::Completed);
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_requires_paused_run() {
        let player = test_player();
        assert!(matches!(player.resume(), Err(PlayerError::NotRunning)));
        assert!(matches!(player.step_back(), Err(PlayerError::NotRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_speed() {
        let player = test_player();
        assert_eq!(player.set_speed(150), Duration::from_millis(200));
        assert_eq!(player.set_speed(1), Duration::from_millis(100));

        player.start("1010", true);
        advance(150).await;
        assert_eq!(player.snapshot().cursor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_steps() {
        let player = test_player();
        let mut rx = player.subscribe();
        player.start("1", true);

        rx.changed().await.unwrap();
        let mut last = rx.borrow_and_update().clone();
        while last.status != SimulationStatus::Completed {
            rx.changed().await.unwrap();
            last = rx.borrow_and_update().clone();
        }
        assert_eq!(last.outcome, Outcome::Rejected);
        assert_eq!(last.trace_len, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_completes_without_timer() {
        let player = test_player();
        let snapshot = player.start("", true);
        assert_eq!(snapshot.status, SimulationStatus::Completed);
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_stops_run() {
        let player = test_player();
        player.start("1010", true);
        player
            .reload(Arc::new(dfasim_core::presets::even_ones()))
            .unwrap();

        assert_eq!(player.snapshot().status, SimulationStatus::Idle);
        assert_eq!(player.automaton().initial_state().as_str(), "even");
    }
}
