//! # TestHost — headless integration test harness
//!
//! Wraps `bevy::app::App` + `RecordingPlugin` for running integration tests
//! without a window or renderer. Storage is in-memory, input handlers record
//! their invocations into a shared journal, and `tick()` advances virtual
//! time so each call runs exactly one `FixedUpdate`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::commands::RecorderCommand;
use crate::controller::{Mode, RecordingController};
use crate::dispatch::{InputDispatcher, InputSource};
use crate::notifications::NotificationLog;
use crate::storage::{MemoryStore, ReplayStorage};
use crate::{GlobalTickCounter, RecordingPlugin, SimulationSpeed, TickCounter};

/// One observed handler invocation: event name, arguments, origin.
pub type DispatchRecord = (String, Vec<f64>, InputSource);

/// A headless Bevy App wrapping `RecordingPlugin` for integration testing.
pub struct TestHost {
    app: App,
    dispatched: Arc<Mutex<Vec<DispatchRecord>>>,
}

impl TestHost {
    /// Create a host with in-memory storage and no handlers registered.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // The host runs a 100ms fixed timestep (10 Hz); insert storage
        // BEFORE the plugin so its disk-backed default never appears.
        app.insert_resource(Time::<Fixed>::from_hz(10.0));
        // Drive time manually: the First-schedule time_system would otherwise
        // overwrite any virtual-time advance with the (near-zero) real delta.
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
        app.insert_resource(ReplayStorage(Box::new(MemoryStore::new())));
        app.add_plugins(RecordingPlugin);

        // Run one update so Startup systems execute.
        app.update();

        Self {
            app,
            dispatched: Arc::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Setup (builder pattern — consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Register an input handler that journals every invocation.
    pub fn with_handler(mut self, name: &str) -> Self {
        let journal = Arc::clone(&self.dispatched);
        let event_name = name.to_string();
        let mut dispatcher = self
            .app
            .world_mut()
            .resource_mut::<InputDispatcher>();
        dispatcher.register(name, move |args, source| {
            journal
                .lock()
                .unwrap()
                .push((event_name.clone(), args.to_vec(), source));
        });
        self
    }

    /// Pre-seed a replay file in the in-memory store.
    pub fn with_file(mut self, name: &str, text: &str) -> Self {
        let mut storage = self.app.world_mut().resource_mut::<ReplayStorage>();
        storage.0.write(name, text);
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks.
    ///
    /// Each call advances virtual time by 100ms and calls `app.update()`,
    /// which triggers the `FixedUpdate` schedule exactly once.
    pub fn tick(&mut self, n: u32) {
        let dt = Duration::from_millis(100);
        self.app
            .world_mut()
            .insert_resource(TimeUpdateStrategy::ManualDuration(dt));
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Queue a command; it applies on the next tick.
    pub fn send(&mut self, command: RecorderCommand) {
        self.app.world_mut().send_event(command);
    }

    /// Feed one live input event into the active recording, stamped with the
    /// current simulation tick.
    pub fn record_input(&mut self, name: &str, value_1: f64, value_2: f64, value_count: u8) {
        let tick = self.app.world().resource::<TickCounter>().0;
        self.app
            .world_mut()
            .resource_mut::<RecordingController>()
            .record_input_history(name, value_1, value_2, value_count, tick);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn controller(&self) -> &RecordingController {
        self.app.world().resource::<RecordingController>()
    }

    pub fn mode(&self) -> Mode {
        self.controller().mode()
    }

    pub fn tick_count(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    pub fn global_tick_count(&self) -> u64 {
        self.app.world().resource::<GlobalTickCounter>().0
    }

    pub fn speed(&self) -> u32 {
        self.app.world().resource::<SimulationSpeed>().0
    }

    /// Read a file from the in-memory store.
    pub fn stored_file(&self, name: &str) -> Option<String> {
        self.app.world().resource::<ReplayStorage>().0.read(name)
    }

    /// Snapshot of all journaled handler invocations, oldest first.
    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.dispatched.lock().unwrap().clone()
    }

    /// Text of the most recent notification, if any.
    pub fn last_notification(&self) -> Option<String> {
        self.app
            .world()
            .resource::<NotificationLog>()
            .last()
            .map(|entry| entry.text.clone())
    }

    /// All notification texts, oldest first.
    pub fn notifications(&self) -> Vec<String> {
        self.app
            .world()
            .resource::<NotificationLog>()
            .entries
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_mode(&self, expected: Mode) {
        let mode = self.mode();
        assert_eq!(mode, expected, "Expected mode {expected:?}, got {mode:?}");
    }

    /// Assert some notification contains the given fragment.
    pub fn assert_notified(&self, fragment: &str) {
        let notifications = self.notifications();
        assert!(
            notifications.iter().any(|text| text.contains(fragment)),
            "Expected a notification containing {fragment:?}, got {notifications:?}"
        );
    }
}
