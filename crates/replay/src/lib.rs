//! # Replay — deterministic input capture and playback
//!
//! Records user-input events tagged with their simulation tick, serializes
//! them to a versioned text file, and plays them back later so that a
//! session reproduces bit-for-bit: same seed, same events, same ticks, same
//! order. Intended for bug reproduction and regression verification in
//! tick-driven hosts.
//!
//! The crate is headless: rendering, console wiring, and the host's own
//! input handlers live outside. Hosts add [`RecordingPlugin`], register
//! their input handlers on [`InputDispatcher`], feed live input into
//! [`RecordingController::record_input_history`], and drive everything by
//! sending [`RecorderCommand`] events.

use bevy::prelude::*;

pub mod codec;
pub mod commands;
pub mod controller;
pub mod dispatch;
pub mod event_log;
pub mod notifications;
pub mod playback;
pub mod plugin;
pub mod sim_rng;
pub mod storage;

#[cfg(test)]
pub mod test_harness;

pub use codec::{CodecError, ReplayFile, REPLAY_VERSION};
pub use commands::RecorderCommand;
pub use controller::{
    Mode, RecordingController, RecordingError, RecordingHook, RecordingSaved, RecordingStarted,
    ReplayStart, ReplayStopped, LAST_REPLAY_FILE, RECENT_WINDOW_TICKS,
};
pub use dispatch::{DispatchError, InputDispatcher, InputSource};
pub use event_log::{InputEventLog, RecordedEvent};
pub use notifications::{NotificationEvent, NotificationKind, NotificationLog};
pub use playback::PlaybackStep;
pub use plugin::RecordingPlugin;
pub use sim_rng::SimRng;
pub use storage::{DiskStore, MemoryStore, ReplayStorage, ReplayStore};

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Simulation tick counter, incremented once per `FixedUpdate`.
///
/// Zeroed by [`RuntimeReset`], so recorded event ticks are relative to the
/// start of their session.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Monotonic tick counter for the lifetime of the process. Never reset.
///
/// Cooldown markers, the start-replay debounce, and playback progress
/// logging all key off this counter rather than [`TickCounter`].
#[derive(Resource, Default)]
pub struct GlobalTickCounter(pub u64);

/// Integer simulation speed multiplier, applied during replay playback.
#[derive(Resource, Debug, PartialEq, Eq)]
pub struct SimulationSpeed(pub u32);

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl SimulationSpeed {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 7;

    /// Clamp a raw requested multiplier into the supported range.
    pub fn clamp(raw: i64) -> u32 {
        raw.clamp(Self::MIN as i64, Self::MAX as i64) as u32
    }
}

/// Event asking the host to restore simulation state to a clean baseline.
///
/// Idempotent: listeners must tolerate back-to-back resets. This crate's
/// own listener zeroes [`TickCounter`]; the host registers its own teardown
/// systems against the same event.
#[derive(Event, Debug, Clone, Copy)]
pub struct RuntimeReset;

/// System sets ordering the recording work within `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingSet {
    /// Tick counters advance first.
    Clock,
    /// Commands apply and playback steps. Host input handling should run
    /// after this so replayed events land on the tick live ones would have.
    Drive,
}

// ---------------------------------------------------------------------------
// Core systems
// ---------------------------------------------------------------------------

/// Advance both tick counters. Runs first in `FixedUpdate`.
pub fn advance_tick_counters(
    mut tick: ResMut<TickCounter>,
    mut global: ResMut<GlobalTickCounter>,
) {
    tick.0 += 1;
    global.0 += 1;
}

/// Zero the simulation tick counter when a runtime reset is broadcast.
pub fn apply_runtime_reset(
    mut resets: EventReader<RuntimeReset>,
    mut tick: ResMut<TickCounter>,
) {
    if resets.read().next().is_some() {
        tick.0 = 0;
    }
}
