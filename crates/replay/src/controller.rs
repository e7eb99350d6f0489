//! Recording controller: the Idle/Recording/Replaying state machine.
//!
//! The controller is the single owner of the mode and of the active session.
//! Sessions are created on transition-in and dropped on transition-out;
//! there is no direct Recording↔Replaying edge, both paths pass through
//! Idle. World-side effects of a transition (runtime reset, RNG reseed,
//! speed change, notifications) are applied by the command executor in
//! [`crate::commands`] based on the outcome values returned here, so every
//! method stays synchronous and unit-testable.

use std::collections::BTreeMap;

use bevy::prelude::*;
use thiserror::Error;

use crate::codec::{CodecError, ReplayFile};
use crate::event_log::{InputEventLog, RecordedEvent};
use crate::playback::PlaybackStep;
use crate::storage::ReplayStore;
use crate::SimulationSpeed;

/// How long "recently started/stopped/completed" stays true, in global ticks.
pub const RECENT_WINDOW_TICKS: u64 = 5;

/// Canonical secondary output written alongside every saved recording.
pub const LAST_REPLAY_FILE: &str = "last_replay.txt";

/// Host loop rate at 1x speed, used for playback progress estimates.
pub(crate) const TICKS_PER_SECOND: u64 = 60;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected operations. The `Display` text doubles as the user-facing
/// guidance message: it always says what to call next.
#[derive(Debug, Error, PartialEq)]
pub enum RecordingError {
    #[error(
        "to start recording, provide an integer seed for random number \
         generation, e.g. start_recording 100"
    )]
    MissingSeed,
    #[error(
        "already recording; stop the current recording first with \
         stop_recording FILE_NAME (or cancel it)"
    )]
    AlreadyRecording,
    #[error("a replay is currently running; stop it first with stop_replay")]
    AlreadyReplaying,
    #[error(
        "specify a file name to save the recording, e.g. stop_recording \
         replay.txt; use cancel_recording to discard it instead"
    )]
    MissingFileName,
    #[error("not currently recording; use start_recording SEED to begin")]
    NotRecording,
    #[error(
        "no replay is currently running; use start_replay FILE_NAME speed 1 \
         to start one"
    )]
    NotReplaying,
    #[error("could not read replay file {name:?}; check the name and try again")]
    FileReadFailure { name: String },
    #[error(
        "could not write replay file {name:?}; the recording is still active, \
         try stop_recording again with another name"
    )]
    FileWriteFailure { name: String },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ---------------------------------------------------------------------------
// Mode and sessions
// ---------------------------------------------------------------------------

/// Operating mode. The three states are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Recording,
    Replaying,
}

/// Live state while recording. Exists only in `Mode::Recording`.
struct RecordingSession {
    seed: u64,
    history: InputEventLog,
}

/// Live state while replaying. Exists only in `Mode::Replaying`.
struct ReplaySession {
    file_name: String,
    events_by_tick: BTreeMap<u64, Vec<RecordedEvent>>,
    cursor: u64,
    stopped_at: u64,
    seed: u64,
    speed: u32,
    started_at_tick: u64,
    completed: bool,
}

/// Deferred replay request serviced by the playback driver on a later tick.
struct PendingReplay {
    file_name: String,
    speed: Option<i64>,
    requested_at: u64,
}

/// Hook signature for tick and completion callbacks.
pub type RecordingHook = Box<dyn FnMut() + Send + Sync>;

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// Successful `start_recording`: the executor resets the runtime and
/// reseeds the RNG with `seed`.
#[derive(Debug, PartialEq)]
pub struct RecordingStarted {
    pub seed: u64,
}

/// Successful `stop_recording`: the session was written to `file_name` and
/// to [`LAST_REPLAY_FILE`].
#[derive(Debug, PartialEq)]
pub struct RecordingSaved {
    pub file_name: String,
    pub event_count: usize,
}

/// `start_replay` either starts, or is swallowed by the stop debounce.
#[derive(Debug, PartialEq)]
pub enum ReplayStart {
    /// The executor resets the runtime, reseeds to `seed`, and applies the
    /// (already clamped) effective speed.
    Started { seed: u64, speed: u32 },
    /// A replay stopped within the last few ticks. The request is dropped
    /// silently so the same input event that stopped a replay cannot
    /// immediately restart it.
    Debounced,
}

/// Successful `stop_replay`: the executor resets speed to 1, resets the
/// runtime, and relays `message` to the user.
#[derive(Debug, PartialEq)]
pub struct ReplayStopped {
    pub message: String,
}

// ---------------------------------------------------------------------------
// RecordingController
// ---------------------------------------------------------------------------

/// Owner of the recording/replay state machine.
///
/// Inserted once by [`crate::RecordingPlugin`]; there is no ambient global.
#[derive(Resource, Default)]
pub struct RecordingController {
    mode: Mode,
    recording: Option<RecordingSession>,
    replay: Option<ReplaySession>,
    pending_replay: Option<PendingReplay>,
    replay_completed_successfully: bool,
    last_recording_stopped_at: Option<u64>,
    last_replay_started_at: Option<u64>,
    last_replay_stopped_at: Option<u64>,
    last_replay_completed_at: Option<u64>,
    on_recording_tick: Option<RecordingHook>,
    on_replay_tick: Option<RecordingHook>,
    on_replay_completed: Option<RecordingHook>,
}

impl RecordingController {
    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Begin a recording session under `seed`.
    pub fn start_recording(&mut self, seed: Option<u64>) -> Result<RecordingStarted, RecordingError> {
        let seed = seed.ok_or(RecordingError::MissingSeed)?;
        match self.mode {
            Mode::Recording => return Err(RecordingError::AlreadyRecording),
            Mode::Replaying => return Err(RecordingError::AlreadyReplaying),
            Mode::Idle => {}
        }
        self.recording = Some(RecordingSession {
            seed,
            history: InputEventLog::new(),
        });
        self.mode = Mode::Recording;
        Ok(RecordingStarted { seed })
    }

    /// Capture one live input event at the given simulation tick.
    ///
    /// No-op unless recording: silently ignored while Idle or Replaying,
    /// which is what lets live input handlers call this unconditionally.
    pub fn record_input_history(
        &mut self,
        name: &str,
        value_1: f64,
        value_2: f64,
        value_count: u8,
        tick: u64,
    ) {
        if self.mode != Mode::Recording {
            return;
        }
        if let Some(session) = self.recording.as_mut() {
            session.history.push(name, value_1, value_2, value_count, tick);
        }
    }

    /// Serialize the session to `file_name` and to [`LAST_REPLAY_FILE`],
    /// then return to Idle.
    ///
    /// A failed write leaves the session intact so the user can retry with
    /// another name.
    pub fn stop_recording(
        &mut self,
        file_name: Option<&str>,
        stopped_at: u64,
        global_tick: u64,
        recorded_at: &str,
        store: &mut dyn ReplayStore,
    ) -> Result<RecordingSaved, RecordingError> {
        let file_name = file_name.ok_or(RecordingError::MissingFileName)?;
        if self.mode != Mode::Recording {
            return Err(RecordingError::NotRecording);
        }
        let Some(session) = self.recording.as_ref() else {
            return Err(RecordingError::NotRecording);
        };

        let file = ReplayFile {
            stopped_at,
            seed: session.seed,
            recorded_at: recorded_at.to_string(),
            events: session.history.events().to_vec(),
        };
        let text = file.encode();
        if !store.write(file_name, &text) {
            return Err(RecordingError::FileWriteFailure {
                name: file_name.to_string(),
            });
        }
        if !store.write(LAST_REPLAY_FILE, &text) {
            return Err(RecordingError::FileWriteFailure {
                name: LAST_REPLAY_FILE.to_string(),
            });
        }

        let event_count = file.events.len();
        self.recording = None;
        self.mode = Mode::Idle;
        self.last_recording_stopped_at = Some(global_tick);
        Ok(RecordingSaved {
            file_name: file_name.to_string(),
            event_count,
        })
    }

    /// Discard the recording session without writing anything.
    pub fn cancel(&mut self) -> Result<(), RecordingError> {
        if self.mode != Mode::Recording {
            return Err(RecordingError::NotRecording);
        }
        self.recording = None;
        self.mode = Mode::Idle;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Load `file_name` and begin playback at the requested speed.
    ///
    /// Version mismatch and corruption reject the file wholesale: no
    /// session is created and the mode stays Idle.
    pub fn start_replay(
        &mut self,
        file_name: Option<&str>,
        speed: Option<i64>,
        global_tick: u64,
        store: &dyn ReplayStore,
    ) -> Result<ReplayStart, RecordingError> {
        if self.replay_recently_stopped(global_tick) {
            return Ok(ReplayStart::Debounced);
        }
        self.replay_completed_successfully = false;
        match self.mode {
            Mode::Recording => return Err(RecordingError::AlreadyRecording),
            Mode::Replaying => return Err(RecordingError::AlreadyReplaying),
            Mode::Idle => {}
        }
        let file_name = file_name.ok_or(RecordingError::MissingFileName)?;
        let text = store
            .read(file_name)
            .ok_or_else(|| RecordingError::FileReadFailure {
                name: file_name.to_string(),
            })?;
        let file = ReplayFile::decode(&text)?;

        let speed = SimulationSpeed::clamp(speed.unwrap_or(1));
        self.replay = Some(ReplaySession {
            file_name: file_name.to_string(),
            events_by_tick: file.events_by_tick(),
            cursor: 0,
            stopped_at: file.stopped_at,
            seed: file.seed,
            speed,
            started_at_tick: global_tick,
            completed: false,
        });
        self.mode = Mode::Replaying;
        self.last_replay_started_at = Some(global_tick);
        Ok(ReplayStart::Started {
            seed: file.seed,
            speed,
        })
    }

    /// End playback and return to Idle, recording the stop marker that
    /// drives the restart debounce.
    pub fn stop_replay(
        &mut self,
        message: &str,
        global_tick: u64,
    ) -> Result<ReplayStopped, RecordingError> {
        if self.mode != Mode::Replaying {
            return Err(RecordingError::NotReplaying);
        }
        self.replay = None;
        self.mode = Mode::Idle;
        self.last_replay_stopped_at = Some(global_tick);
        Ok(ReplayStopped {
            message: message.to_string(),
        })
    }

    /// Ask the playback driver to start this replay on the next tick
    /// instead of immediately.
    pub fn request_replay_next_tick(&mut self, file_name: &str, speed: Option<i64>, global_tick: u64) {
        self.pending_replay = Some(PendingReplay {
            file_name: file_name.to_string(),
            speed,
            requested_at: global_tick,
        });
    }

    /// Take the pending request once at least one tick has passed since it
    /// was made.
    pub(crate) fn take_pending_replay(&mut self, global_tick: u64) -> Option<(String, Option<i64>)> {
        if self
            .pending_replay
            .as_ref()
            .is_some_and(|pending| pending.requested_at < global_tick)
        {
            self.pending_replay
                .take()
                .map(|pending| (pending.file_name, pending.speed))
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Playback stepping
    // -----------------------------------------------------------------------

    /// Advance playback by one tick. Called once per `FixedUpdate` by the
    /// playback driver while replaying.
    ///
    /// Completion is checked before any events for the current cursor are
    /// fetched; on completion the session is torn down via [`stop_replay`]
    /// and the driver applies the remaining world-side effects.
    ///
    /// [`stop_replay`]: RecordingController::stop_replay
    pub fn step_replay(&mut self, global_tick: u64) -> PlaybackStep {
        if self.mode != Mode::Replaying {
            return PlaybackStep::Inactive;
        }
        let Some(session) = self.replay.as_mut() else {
            return PlaybackStep::Inactive;
        };

        if !session.completed && session.stopped_at.saturating_sub(session.cursor) <= 1 {
            session.completed = true;
            let file_name = session.file_name.clone();
            self.replay_completed_successfully = true;
            self.last_replay_completed_at = Some(global_tick);
            if let Some(hook) = self.on_replay_completed.as_mut() {
                hook();
            }
            let message = format!(
                "Replay completed [{file_name}]. To rerun it, call start_replay \
                 \"{file_name}\" again."
            );
            return match self.stop_replay(&message, global_tick) {
                Ok(stopped) => PlaybackStep::Completed {
                    message: stopped.message,
                },
                Err(_) => PlaybackStep::Inactive,
            };
        }

        // Events for this cursor position are consumed exactly once; the
        // cursor never revisits a tick.
        let events = session
            .events_by_tick
            .remove(&session.cursor)
            .unwrap_or_default();
        session.cursor += 1;

        let interval = TICKS_PER_SECOND * u64::from(session.speed);
        let seconds_remaining = if global_tick % interval == 0 {
            let remaining = (session.stopped_at + session.started_at_tick)
                .saturating_sub(global_tick);
            Some(remaining / interval)
        } else {
            None
        };

        PlaybackStep::Events {
            events,
            seconds_remaining,
        }
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Invoked once per tick while recording.
    pub fn set_on_recording_tick(&mut self, hook: impl FnMut() + Send + Sync + 'static) {
        self.on_recording_tick = Some(Box::new(hook));
    }

    /// Invoked once per tick while replaying.
    pub fn set_on_replay_tick(&mut self, hook: impl FnMut() + Send + Sync + 'static) {
        self.on_replay_tick = Some(Box::new(hook));
    }

    /// Invoked once when a replay runs to completion (not on manual stop).
    pub fn set_on_replay_completed(&mut self, hook: impl FnMut() + Send + Sync + 'static) {
        self.on_replay_completed = Some(Box::new(hook));
    }

    pub(crate) fn run_tick_hooks(&mut self) {
        match self.mode {
            Mode::Recording => {
                if let Some(hook) = self.on_recording_tick.as_mut() {
                    hook();
                }
            }
            Mode::Replaying => {
                if let Some(hook) = self.on_replay_tick.as_mut() {
                    hook();
                }
            }
            Mode::Idle => {}
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode == Mode::Recording
    }

    pub fn is_replaying(&self) -> bool {
        self.mode == Mode::Replaying
    }

    /// Whether the last replay ran to its end rather than being stopped.
    pub fn replay_completed_successfully(&self) -> bool {
        self.replay_completed_successfully
    }

    pub fn recording_recently_completed(&self, global_tick: u64) -> bool {
        Self::within_window(self.last_recording_stopped_at, global_tick)
    }

    pub fn replay_recently_started(&self, global_tick: u64) -> bool {
        Self::within_window(self.last_replay_started_at, global_tick)
    }

    pub fn replay_recently_stopped(&self, global_tick: u64) -> bool {
        Self::within_window(self.last_replay_stopped_at, global_tick)
    }

    pub fn replay_recently_completed(&self, global_tick: u64) -> bool {
        Self::within_window(self.last_replay_completed_at, global_tick)
    }

    /// Forget the last replay stop, lifting the restart debounce early.
    pub fn clear_replay_stopped_marker(&mut self) {
        self.last_replay_stopped_at = None;
    }

    /// File name of the active replay, if any.
    pub fn replay_file_name(&self) -> Option<&str> {
        self.replay.as_ref().map(|s| s.file_name.as_str())
    }

    /// Seed of the active replay, if any.
    pub fn replay_seed(&self) -> Option<u64> {
        self.replay.as_ref().map(|s| s.seed)
    }

    /// Effective (clamped) speed of the active replay, if any.
    pub fn replay_speed(&self) -> Option<u32> {
        self.replay.as_ref().map(|s| s.speed)
    }

    /// Playback cursor of the active replay, if any.
    pub fn replay_cursor(&self) -> Option<u64> {
        self.replay.as_ref().map(|s| s.cursor)
    }

    /// Number of events captured so far in the active recording, if any.
    pub fn recorded_event_count(&self) -> Option<usize> {
        self.recording.as_ref().map(|s| s.history.len())
    }

    fn within_window(marker: Option<u64>, global_tick: u64) -> bool {
        marker.is_some_and(|at| global_tick.saturating_sub(at) <= RECENT_WINDOW_TICKS)
    }
}
