//! Recorder command events and their executor.
//!
//! Hosts never mutate the controller's mode directly: they send a
//! [`RecorderCommand`] and the executor system applies it, together with the
//! world-side effects a transition implies (runtime reset, RNG reseed, speed
//! change, user notification). Running all commands through one system keeps
//! the effects in a single place and a deterministic order.

use bevy::prelude::*;

use crate::controller::{RecordingController, ReplayStart};
use crate::notifications::NotificationEvent;
use crate::sim_rng::SimRng;
use crate::storage::{ReplayStore, ReplayStorage};
use crate::{GlobalTickCounter, RuntimeReset, SimulationSpeed, TickCounter};

/// A request to the recording controller.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum RecorderCommand {
    StartRecording {
        seed: Option<u64>,
    },
    StopRecording {
        file_name: Option<String>,
    },
    CancelRecording,
    StartReplay {
        file_name: Option<String>,
        speed: Option<i64>,
    },
    /// Start a replay on the next fixed tick instead of immediately.
    ReplayNextTick {
        file_name: String,
        speed: Option<i64>,
    },
    StopReplay,
    /// Lift the post-stop restart debounce early.
    ClearReplayStoppedMarker,
}

/// Apply queued [`RecorderCommand`]s to the controller.
#[allow(clippy::too_many_arguments)]
pub fn apply_recorder_commands(
    mut commands: EventReader<RecorderCommand>,
    mut controller: ResMut<RecordingController>,
    tick: Res<TickCounter>,
    global: Res<GlobalTickCounter>,
    mut storage: ResMut<ReplayStorage>,
    mut rng: ResMut<SimRng>,
    mut speed: ResMut<SimulationSpeed>,
    mut resets: EventWriter<RuntimeReset>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    for command in commands.read() {
        match command {
            RecorderCommand::StartRecording { seed } => {
                match controller.start_recording(*seed) {
                    Ok(started) => {
                        rng.reseed(started.seed);
                        resets.send(RuntimeReset);
                        notifications.send(NotificationEvent::info(format!(
                            "Recording started with seed {}. Stop and save with \
                             stop_recording FILE_NAME.",
                            started.seed
                        )));
                    }
                    Err(err) => {
                        notifications.send(NotificationEvent::warning(err.to_string()));
                    }
                }
            }
            RecorderCommand::StopRecording { file_name } => {
                let recorded_at = chrono::Local::now()
                    .format("%Y-%m-%d %H:%M:%S %z")
                    .to_string();
                match controller.stop_recording(
                    file_name.as_deref(),
                    tick.0,
                    global.0,
                    &recorded_at,
                    storage.0.as_mut(),
                ) {
                    Ok(saved) => {
                        resets.send(RuntimeReset);
                        notifications.send(NotificationEvent::info(format!(
                            "Recording saved to [{}] ({} events). Play it back with \
                             start_replay \"{}\".",
                            saved.file_name, saved.event_count, saved.file_name
                        )));
                    }
                    Err(err) => {
                        notifications.send(NotificationEvent::warning(err.to_string()));
                    }
                }
            }
            RecorderCommand::CancelRecording => match controller.cancel() {
                Ok(()) => {
                    resets.send(RuntimeReset);
                    notifications.send(NotificationEvent::info("Recording cancelled."));
                }
                Err(err) => {
                    notifications.send(NotificationEvent::warning(err.to_string()));
                }
            },
            RecorderCommand::StartReplay { file_name, speed: requested } => {
                start_replay_now(
                    &mut controller,
                    file_name.as_deref(),
                    *requested,
                    global.0,
                    storage.0.as_ref(),
                    &mut rng,
                    &mut speed,
                    &mut resets,
                    &mut notifications,
                );
            }
            RecorderCommand::ReplayNextTick {
                file_name,
                speed: requested,
            } => {
                controller.request_replay_next_tick(file_name, *requested, global.0);
            }
            RecorderCommand::StopReplay => {
                let message = match controller.replay_file_name() {
                    Some(name) => format!("Replay stopped [{name}]."),
                    None => "Replay stopped.".to_string(),
                };
                match controller.stop_replay(&message, global.0) {
                    Ok(stopped) => {
                        *speed = SimulationSpeed(SimulationSpeed::MIN);
                        resets.send(RuntimeReset);
                        notifications.send(NotificationEvent::info(stopped.message));
                    }
                    Err(err) => {
                        notifications.send(NotificationEvent::warning(err.to_string()));
                    }
                }
            }
            RecorderCommand::ClearReplayStoppedMarker => {
                controller.clear_replay_stopped_marker();
            }
        }
    }
}

/// Start a replay immediately and apply its world-side effects.
///
/// Shared by the command executor and the playback driver's deferred-start
/// path so both start a replay identically.
#[allow(clippy::too_many_arguments)]
pub(crate) fn start_replay_now(
    controller: &mut RecordingController,
    file_name: Option<&str>,
    requested_speed: Option<i64>,
    global_tick: u64,
    store: &dyn ReplayStore,
    rng: &mut SimRng,
    speed: &mut SimulationSpeed,
    resets: &mut EventWriter<RuntimeReset>,
    notifications: &mut EventWriter<NotificationEvent>,
) {
    match controller.start_replay(file_name, requested_speed, global_tick, store) {
        Ok(ReplayStart::Started {
            seed,
            speed: effective,
        }) => {
            rng.reseed(seed);
            *speed = SimulationSpeed(effective);
            resets.send(RuntimeReset);
            let name = file_name.unwrap_or_default();
            notifications.send(NotificationEvent::info(format!(
                "Replaying [{name}] at {effective}x speed."
            )));
        }
        // The same key press that stops a replay must not restart it.
        Ok(ReplayStart::Debounced) => {}
        Err(err) => {
            notifications.send(NotificationEvent::warning(err.to_string()));
        }
    }
}
