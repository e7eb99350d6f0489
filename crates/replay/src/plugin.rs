//! Plugin wiring for the recording subsystem.

use bevy::app::FixedUpdate;
use bevy::prelude::*;

use crate::commands::{apply_recorder_commands, RecorderCommand};
use crate::controller::RecordingController;
use crate::dispatch::InputDispatcher;
use crate::notifications::{collect_notifications, NotificationEvent, NotificationLog};
use crate::playback::drive_playback;
use crate::sim_rng::SimRng;
use crate::storage::ReplayStorage;
use crate::{
    advance_tick_counters, apply_runtime_reset, GlobalTickCounter, RecordingSet, RuntimeReset,
    SimulationSpeed, TickCounter,
};

/// Installs the recording controller, playback driver, and their resources.
///
/// Every system runs in `FixedUpdate`: counters tick in
/// [`RecordingSet::Clock`], then commands apply and playback steps in
/// [`RecordingSet::Drive`]. Hosts that insert their own [`ReplayStorage`]
/// before adding the plugin keep it; otherwise a disk-backed store rooted at
/// `replays/` is used.
pub struct RecordingPlugin;

impl Plugin for RecordingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<GlobalTickCounter>()
            .init_resource::<SimulationSpeed>()
            .init_resource::<SimRng>()
            .init_resource::<RecordingController>()
            .init_resource::<InputDispatcher>()
            .init_resource::<ReplayStorage>()
            .init_resource::<NotificationLog>()
            .add_event::<RecorderCommand>()
            .add_event::<RuntimeReset>()
            .add_event::<NotificationEvent>()
            .configure_sets(
                FixedUpdate,
                (RecordingSet::Clock, RecordingSet::Drive).chain(),
            )
            .add_systems(
                FixedUpdate,
                advance_tick_counters.in_set(RecordingSet::Clock),
            )
            .add_systems(
                FixedUpdate,
                (apply_recorder_commands, drive_playback)
                    .chain()
                    .in_set(RecordingSet::Drive),
            )
            .add_systems(
                FixedUpdate,
                (apply_runtime_reset, collect_notifications).after(RecordingSet::Drive),
            );
    }
}
