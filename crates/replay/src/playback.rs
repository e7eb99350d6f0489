//! Fixed-timestep playback driver.
//!
//! One step of playback runs per `FixedUpdate` while a replay is active:
//! events recorded at the cursor tick are re-dispatched through the
//! [`InputDispatcher`] with [`InputSource::Replay`], then the cursor
//! advances. The controller decides what the step is; this module applies
//! its world-side effects.

use bevy::prelude::*;

use crate::commands::start_replay_now;
use crate::controller::RecordingController;
use crate::dispatch::{InputDispatcher, InputSource};
use crate::event_log::RecordedEvent;
use crate::notifications::NotificationEvent;
use crate::sim_rng::SimRng;
use crate::storage::ReplayStorage;
use crate::{GlobalTickCounter, RuntimeReset, SimulationSpeed};

/// Outcome of advancing playback by one tick.
#[derive(Debug, PartialEq)]
pub enum PlaybackStep {
    /// No replay is active; nothing happened.
    Inactive,
    /// The cursor advanced. `events` may be empty for a quiet tick;
    /// `seconds_remaining` is set on progress-report ticks.
    Events {
        events: Vec<RecordedEvent>,
        seconds_remaining: Option<u64>,
    },
    /// Playback reached the recording's end and the session was torn down.
    Completed { message: String },
}

/// Drive the active replay (and service deferred start requests) once per
/// fixed tick.
#[allow(clippy::too_many_arguments)]
pub fn drive_playback(
    mut controller: ResMut<RecordingController>,
    global: Res<GlobalTickCounter>,
    storage: Res<ReplayStorage>,
    mut dispatcher: ResMut<InputDispatcher>,
    mut rng: ResMut<SimRng>,
    mut speed: ResMut<SimulationSpeed>,
    mut resets: EventWriter<RuntimeReset>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let global_tick = global.0;
    controller.run_tick_hooks();

    // A deferred start consumes this tick; stepping begins on the next one.
    if let Some((file_name, requested_speed)) = controller.take_pending_replay(global_tick) {
        start_replay_now(
            &mut controller,
            Some(file_name.as_str()),
            requested_speed,
            global_tick,
            storage.0.as_ref(),
            &mut rng,
            &mut speed,
            &mut resets,
            &mut notifications,
        );
        return;
    }

    match controller.step_replay(global_tick) {
        PlaybackStep::Inactive => {}
        PlaybackStep::Events {
            events,
            seconds_remaining,
        } => {
            for event in &events {
                if let Err(err) = dispatcher.dispatch(&event.name, &event.args(), InputSource::Replay)
                {
                    notifications.send(NotificationEvent::warning(err.to_string()));
                }
            }
            if let Some(seconds) = seconds_remaining {
                notifications.send(NotificationEvent::info(format!(
                    "replay ends in {seconds} seconds"
                )));
            }
        }
        PlaybackStep::Completed { message } => {
            *speed = SimulationSpeed(SimulationSpeed::MIN);
            resets.send(RuntimeReset);
            notifications.send(NotificationEvent::info(message));
        }
    }
}
