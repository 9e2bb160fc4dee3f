//! Real-time macro playback.
//!
//! A blocking session loop (`play_macro`) drives key emission against a
//! wall clock with drift-corrected, interruptible waits, and a `Player`
//! handle owns the single active session on a dedicated worker thread,
//! reporting back over a channel the way the engine does in a DAW
//! transport.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::events::{MacroEvent, total_duration};

/// Destination for emitted key combinations. The real implementation is an
/// OS-level injection primitive outside this crate; tests and the CLI use
/// local sinks.
pub trait KeySink: Send {
    fn send(&mut self, combo: &str);
}

/// A sink that just logs what it would press.
#[derive(Debug, Default)]
pub struct TracingSink;

impl KeySink for TracingSink {
    fn send(&mut self, combo: &str) {
        tracing::info!(combo, "key");
    }
}

#[derive(Debug, Default)]
struct Flags {
    paused: bool,
    cancelled: bool,
}

/// Shared pause/cancel switchboard for one playback session.
///
/// Waits inside the session loop block on the condvar, so a pause or
/// cancel from any thread wakes the worker immediately rather than after
/// the pending delay expires.
#[derive(Default)]
pub struct PlaybackControl {
    flags: Mutex<Flags>,
    signal: Condvar,
}

impl PlaybackControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.flags.lock().paused = true;
        self.signal.notify_all();
    }

    pub fn resume(&self) {
        self.flags.lock().paused = false;
        self.signal.notify_all();
    }

    pub fn cancel(&self) {
        self.flags.lock().cancelled = true;
        self.signal.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.flags.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.lock().cancelled
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` on
    /// cancellation. Used for lead-in and playlist gaps; pause does not
    /// apply here.
    pub fn sleep_unless_cancelled(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut flags = self.flags.lock();
        loop {
            if flags.cancelled {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            self.signal.wait_for(&mut flags, deadline - now);
        }
    }
}

/// How a session ended, with the number of keys actually emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished { emitted: usize },
    Cancelled { emitted: usize },
}

impl Outcome {
    pub fn emitted(&self) -> usize {
        match self {
            Outcome::Finished { emitted } | Outcome::Cancelled { emitted } => *emitted,
        }
    }
}

/// Play a finished macro, blocking until it ends or is cancelled.
///
/// Each event's wait is recomputed from the wall clock, so emission drift
/// never accumulates. Time spent paused is subtracted from the clock: the
/// schedule freezes while paused and resumes where it left off. A cancel
/// observed during a pending wait returns without emitting that event.
pub fn play_macro(
    events: &[MacroEvent],
    control: &PlaybackControl,
    emit: &mut dyn FnMut(&str),
    mut progress: Option<&mut dyn FnMut(usize, f64, f64)>,
) -> Outcome {
    let total = total_duration(events);
    let start = Instant::now();
    let mut paused_total = Duration::ZERO;

    for (index, event) in events.iter().enumerate() {
        let target = Duration::from_secs_f64(event.time);

        let mut flags = control.flags.lock();
        loop {
            if flags.cancelled {
                return Outcome::Cancelled { emitted: index };
            }

            if flags.paused {
                let pause_started = Instant::now();
                while flags.paused && !flags.cancelled {
                    control.signal.wait(&mut flags);
                }
                paused_total += pause_started.elapsed();
                continue;
            }

            let elapsed = start.elapsed().saturating_sub(paused_total);
            if elapsed >= target {
                break;
            }

            // Wakes early on pause or cancel; the loop re-checks both.
            control.signal.wait_for(&mut flags, target - elapsed);
        }
        drop(flags);

        emit(&event.key);

        if let Some(report) = progress.as_mut() {
            let elapsed = start.elapsed().saturating_sub(paused_total);
            report(index, elapsed.as_secs_f64(), total);
        }
    }

    Outcome::Finished {
        emitted: events.len(),
    }
}

/// Status/progress messages from the worker thread.
#[derive(Debug, Clone)]
pub enum PlayerUpdate {
    TrackStarted { index: usize, path: std::path::PathBuf },
    Progress { index: usize, elapsed: f64, total: f64 },
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Running,
    Paused,
}

/// Owner of the single active playback session.
///
/// Playback runs on a dedicated worker thread so the caller is never
/// blocked; pause/resume/stop signal the session's control block from any
/// thread. Starting a new session cancels the previous one and joins its
/// worker first, so two sessions can never emit at the same time.
pub struct Player {
    sink: Arc<Mutex<Box<dyn KeySink>>>,
    control: Arc<PlaybackControl>,
    worker: Option<JoinHandle<()>>,
    update_tx: Sender<PlayerUpdate>,
    update_rx: Receiver<PlayerUpdate>,
}

impl Player {
    pub fn new(sink: Box<dyn KeySink>) -> Self {
        let (update_tx, update_rx) = crossbeam::channel::unbounded();
        Self {
            sink: Arc::new(Mutex::new(sink)),
            control: Arc::new(PlaybackControl::new()),
            worker: None,
            update_tx,
            update_rx,
        }
    }

    pub fn updates(&self) -> &Receiver<PlayerUpdate> {
        &self.update_rx
    }

    pub fn state(&self) -> PlayerState {
        if !self.is_active() {
            PlayerState::Idle
        } else if self.control.is_paused() {
            PlayerState::Paused
        } else {
            PlayerState::Running
        }
    }

    pub fn is_active(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Start playing `events`, replacing any session in flight.
    pub fn play(&mut self, events: Arc<Vec<MacroEvent>>) {
        let (control, sink, update_tx) = self.begin_session();

        self.worker = Some(std::thread::spawn(move || {
            let mut emit = |combo: &str| sink.lock().send(combo);
            let mut report = |index: usize, elapsed: f64, total: f64| {
                let _ = update_tx.send(PlayerUpdate::Progress {
                    index,
                    elapsed,
                    total,
                });
            };
            let outcome = play_macro(&events, &control, &mut emit, Some(&mut report));
            let _ = update_tx.send(match outcome {
                Outcome::Finished { .. } => PlayerUpdate::Finished,
                Outcome::Cancelled { .. } => PlayerUpdate::Cancelled,
            });
        }));
    }

    /// Play several files in order, pre-warming each next macro while the
    /// current one plays.
    pub fn play_playlist(
        &mut self,
        tracks: Vec<std::path::PathBuf>,
        start: usize,
        config: crate::config::Config,
    ) {
        let (control, sink, update_tx) = self.begin_session();

        self.worker = Some(std::thread::spawn(move || {
            let mut emit = |combo: &str| sink.lock().send(combo);
            let outcome =
                crate::playlist::run(&tracks, start, &config, &control, &mut emit, &update_tx);
            let _ = update_tx.send(match outcome {
                Outcome::Finished { .. } => PlayerUpdate::Finished,
                Outcome::Cancelled { .. } => PlayerUpdate::Cancelled,
            });
        }));
    }

    pub fn pause(&self) {
        if self.is_active() {
            self.control.pause();
        }
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Cancel the current session and wait for its worker to exit.
    pub fn stop(&mut self) {
        self.control.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn begin_session(
        &mut self,
    ) -> (
        Arc<PlaybackControl>,
        Arc<Mutex<Box<dyn KeySink>>>,
        Sender<PlayerUpdate>,
    ) {
        self.stop();
        // Fresh control per session: cancel/pause state never leaks into
        // the next one.
        self.control = Arc::new(PlaybackControl::new());
        (
            self.control.clone(),
            self.sink.clone(),
            self.update_tx.clone(),
        )
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn macro_of(times: &[f64]) -> Vec<MacroEvent> {
        times
            .iter()
            .enumerate()
            .map(|(i, &time)| MacroEvent {
                time,
                key: format!("k{i}"),
                pitch: 60,
                channel: 0,
            })
            .collect()
    }

    #[test]
    fn emits_every_event_in_order() {
        let events = macro_of(&[0.0, 0.01, 0.02]);
        let control = PlaybackControl::new();
        let mut sent = Vec::new();
        let outcome = play_macro(&events, &control, &mut |combo| sent.push(combo.to_string()), None);
        assert_eq!(outcome, Outcome::Finished { emitted: 3 });
        assert_eq!(sent, vec!["k0", "k1", "k2"]);
    }

    #[test]
    fn empty_macro_finishes_immediately() {
        let control = PlaybackControl::new();
        let outcome = play_macro(&[], &control, &mut |_| {}, None);
        assert_eq!(outcome, Outcome::Finished { emitted: 0 });
    }

    #[test]
    fn progress_reports_index_and_total() {
        let events = macro_of(&[0.0, 0.01]);
        let control = PlaybackControl::new();
        let reports: StdMutex<Vec<(usize, f64)>> = StdMutex::new(Vec::new());
        let mut report = |index: usize, _elapsed: f64, total: f64| {
            reports.lock().unwrap().push((index, total));
        };
        play_macro(&events, &control, &mut |_| {}, Some(&mut report));
        let reports = reports.into_inner().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], (0, 0.01));
        assert_eq!(reports[1], (1, 0.01));
    }

    #[test]
    fn cancel_during_wait_returns_promptly_without_emitting() {
        let events = macro_of(&[5.0]);
        let control = Arc::new(PlaybackControl::new());

        let control2 = control.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            control2.cancel();
        });

        let started = Instant::now();
        let mut emitted = 0usize;
        let outcome = play_macro(&events, &control, &mut |_| emitted += 1, None);

        assert_eq!(outcome, Outcome::Cancelled { emitted: 0 });
        assert_eq!(emitted, 0);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "cancel did not interrupt the pending wait"
        );
        canceller.join().unwrap();
    }

    #[test]
    fn paused_time_does_not_count_toward_the_schedule() {
        let events = macro_of(&[0.2]);
        let control = Arc::new(PlaybackControl::new());

        let control2 = control.clone();
        let pauser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            control2.pause();
            std::thread::sleep(Duration::from_millis(300));
            control2.resume();
        });

        let started = Instant::now();
        let outcome = play_macro(&events, &control, &mut |_| {}, None);
        let elapsed = started.elapsed();

        assert_eq!(outcome, Outcome::Finished { emitted: 1 });
        // 200 ms schedule + ~300 ms pause; well past 200 ms proves the
        // clock stopped, the upper bound catches a runaway wait.
        assert!(elapsed >= Duration::from_millis(400), "pause was not honored");
        assert!(elapsed < Duration::from_secs(3));
        pauser.join().unwrap();
    }

    #[test]
    fn cancel_while_paused_stops_playback() {
        let events = macro_of(&[0.1]);
        let control = Arc::new(PlaybackControl::new());
        control.pause();

        let control2 = control.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            control2.cancel();
        });

        let outcome = play_macro(&events, &control, &mut |_| {}, None);
        assert_eq!(outcome, Outcome::Cancelled { emitted: 0 });
        canceller.join().unwrap();
    }

    #[test]
    fn sleep_unless_cancelled_wakes_on_cancel() {
        let control = Arc::new(PlaybackControl::new());
        let control2 = control.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            control2.cancel();
        });

        let started = Instant::now();
        let completed = control.sleep_unless_cancelled(Duration::from_secs(5));
        assert!(!completed);
        assert!(started.elapsed() < Duration::from_secs(1));
        canceller.join().unwrap();
    }

    struct Recorder(Arc<StdMutex<Vec<String>>>);

    impl KeySink for Recorder {
        fn send(&mut self, combo: &str) {
            self.0.lock().unwrap().push(combo.to_string());
        }
    }

    #[test]
    fn player_runs_a_session_to_completion() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mut player = Player::new(Box::new(Recorder(sent.clone())));
        assert_eq!(player.state(), PlayerState::Idle);

        player.play(Arc::new(macro_of(&[0.0, 0.01])));

        // Wait for the terminal update.
        let mut finished = false;
        for update in player.updates().iter() {
            match update {
                PlayerUpdate::Finished => {
                    finished = true;
                    break;
                }
                PlayerUpdate::Cancelled => break,
                _ => {}
            }
        }
        assert!(finished);
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn new_play_request_replaces_the_active_session() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mut player = Player::new(Box::new(Recorder(sent.clone())));

        // First session would take 30 s; replace it immediately.
        player.play(Arc::new(macro_of(&[30.0])));
        player.play(Arc::new(macro_of(&[0.0])));

        let mut outcomes = Vec::new();
        for update in player.updates().iter() {
            match update {
                PlayerUpdate::Finished | PlayerUpdate::Cancelled => {
                    outcomes.push(update);
                    if outcomes.len() == 2 {
                        break;
                    }
                }
                _ => {}
            }
        }
        assert!(matches!(outcomes[0], PlayerUpdate::Cancelled));
        assert!(matches!(outcomes[1], PlayerUpdate::Finished));
        // Only the second session's event was emitted.
        assert_eq!(sent.lock().unwrap().as_slice(), &["k0".to_string()]);
    }

    #[test]
    fn stop_is_idempotent_and_safe_when_idle() {
        let mut player = Player::new(Box::new(TracingSink));
        player.stop();
        player.stop();
        assert_eq!(player.state(), PlayerState::Idle);
    }
}
