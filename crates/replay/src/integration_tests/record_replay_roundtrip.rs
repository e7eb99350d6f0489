//! Controller-level roundtrips: record a session to storage, replay it, and
//! verify the dispatched events reproduce the capture exactly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::controller::{Mode, RecordingController, ReplayStart, LAST_REPLAY_FILE};
use crate::dispatch::{InputDispatcher, InputSource};
use crate::playback::PlaybackStep;
use crate::storage::{MemoryStore, ReplayStore};

#[test]
fn recording_produces_expected_file_text() {
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();

    controller.start_recording(Some(42)).unwrap();
    controller.record_input_history("jump", 1.0, 0.0, 1, 5);
    controller.record_input_history("fire", 0.0, 0.0, 0, 5);
    controller.record_input_history("move", 3.0, 4.0, 2, 6);
    controller
        .stop_recording(Some("r.txt"), 6, 50, "2026-08-29 12:00:00", &mut store)
        .unwrap();

    let expected = "replay_version 2.0\n\
                    stopped_at 6\n\
                    seed 42\n\
                    recorded_at 2026-08-29 12:00:00\n\
                    [jump:,1,0,1,1,5]\n\
                    [fire:,0,0,0,2,5]\n\
                    [move:,3,4,2,3,6]\n";
    assert_eq!(store.read("r.txt").as_deref(), Some(expected));
    assert_eq!(store.read(LAST_REPLAY_FILE).as_deref(), Some(expected));
}

/// Step an active replay tick by tick until it completes, dispatching each
/// event group in order. Returns the completion message.
fn run_to_completion(
    controller: &mut RecordingController,
    dispatcher: &mut InputDispatcher,
    mut global_tick: u64,
) -> String {
    for _ in 0..1000 {
        global_tick += 1;
        match controller.step_replay(global_tick) {
            PlaybackStep::Inactive => panic!("replay went inactive without completing"),
            PlaybackStep::Events { events, .. } => {
                for event in &events {
                    dispatcher
                        .dispatch(&event.name, &event.args(), InputSource::Replay)
                        .unwrap();
                }
            }
            PlaybackStep::Completed { message } => return message,
        }
    }
    panic!("replay never completed");
}

#[test]
fn full_roundtrip_dispatches_in_capture_order() {
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();

    controller.start_recording(Some(42)).unwrap();
    controller.record_input_history("jump", 1.0, 0.0, 1, 5);
    controller.record_input_history("fire", 0.0, 0.0, 0, 5);
    controller.record_input_history("move", 3.0, 4.0, 2, 6);
    controller
        .stop_recording(Some("r.txt"), 16, 90, "t", &mut store)
        .unwrap();

    let calls: Arc<Mutex<Vec<(String, Vec<f64>, InputSource)>>> = Arc::default();
    let mut dispatcher = InputDispatcher::default();
    for name in ["jump", "fire", "move"] {
        let sink = Arc::clone(&calls);
        let event_name = name.to_string();
        dispatcher.register(name, move |args, source| {
            sink.lock()
                .unwrap()
                .push((event_name.clone(), args.to_vec(), source));
        });
    }

    let start = controller
        .start_replay(Some("r.txt"), None, 100, &store)
        .unwrap();
    assert_eq!(start, ReplayStart::Started { seed: 42, speed: 1 });

    let message = run_to_completion(&mut controller, &mut dispatcher, 100);
    assert!(message.contains("r.txt"), "unexpected message: {message}");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], ("jump".to_string(), vec![1.0], InputSource::Replay));
    assert_eq!(calls[1], ("fire".to_string(), vec![], InputSource::Replay));
    assert_eq!(
        calls[2],
        ("move".to_string(), vec![3.0, 4.0], InputSource::Replay)
    );

    assert_eq!(controller.mode(), Mode::Idle);
    assert!(controller.replay_completed_successfully());
    assert!(controller.replay_recently_completed(120));
    assert!(controller.replay_recently_stopped(120));
}

#[test]
fn completion_check_precedes_trailing_event_dispatch() {
    // A recording stopped on the tick of its last events ends playback one
    // cursor position before those events would fire.
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();
    controller.start_recording(Some(1)).unwrap();
    controller.record_input_history("jump", 1.0, 0.0, 1, 5);
    controller.record_input_history("move", 3.0, 4.0, 2, 6);
    controller
        .stop_recording(Some("r.txt"), 6, 0, "t", &mut store)
        .unwrap();

    controller.start_replay(Some("r.txt"), None, 10, &store).unwrap();
    let mut dispatched = 0usize;
    for global_tick in 11.. {
        match controller.step_replay(global_tick) {
            PlaybackStep::Events { events, .. } => dispatched += events.len(),
            PlaybackStep::Completed { .. } => break,
            PlaybackStep::Inactive => panic!("replay went inactive"),
        }
    }
    assert_eq!(dispatched, 0);
    assert_eq!(controller.mode(), Mode::Idle);
}

#[test]
fn completion_triggers_one_cursor_short_of_the_stop_tick() {
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();
    controller.start_recording(Some(1)).unwrap();
    controller
        .stop_recording(Some("r.txt"), 10, 0, "t", &mut store)
        .unwrap();
    controller.start_replay(Some("r.txt"), None, 20, &store).unwrap();

    // Cursor positions 0..=8 all step normally.
    for step in 1..=9u64 {
        assert!(
            matches!(controller.step_replay(20 + step), PlaybackStep::Events { .. }),
            "step {step} should still be playing"
        );
    }
    assert_eq!(controller.replay_cursor(), Some(9));
    assert!(matches!(
        controller.step_replay(30),
        PlaybackStep::Completed { .. }
    ));
    assert_eq!(controller.mode(), Mode::Idle);
}

#[test]
fn progress_estimate_appears_on_report_ticks() {
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();
    controller.start_recording(Some(1)).unwrap();
    controller.record_input_history("jump", 1.0, 0.0, 1, 100);
    controller
        .stop_recording(Some("r.txt"), 200, 0, "t", &mut store)
        .unwrap();

    // Start at global tick 59 so the first step lands on a report tick.
    controller.start_replay(Some("r.txt"), None, 59, &store).unwrap();

    let step = controller.step_replay(60);
    let PlaybackStep::Events {
        seconds_remaining, ..
    } = step
    else {
        panic!("expected an event step, got {step:?}");
    };
    // (200 + 59 - 60) / 60 seconds left at 1x.
    assert_eq!(seconds_remaining, Some(3));

    let step = controller.step_replay(61);
    let PlaybackStep::Events {
        seconds_remaining, ..
    } = step
    else {
        panic!("expected an event step, got {step:?}");
    };
    assert_eq!(seconds_remaining, None);
}

#[test]
fn tick_and_completion_hooks_fire_in_their_modes() {
    let mut store = MemoryStore::new();
    let mut controller = RecordingController::default();

    let recording_ticks = Arc::new(AtomicUsize::new(0));
    let replay_ticks = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&recording_ticks);
    controller.set_on_recording_tick(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = Arc::clone(&replay_ticks);
    controller.set_on_replay_tick(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = Arc::clone(&completions);
    controller.set_on_replay_completed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Idle: nothing fires.
    controller.run_tick_hooks();
    assert_eq!(recording_ticks.load(Ordering::SeqCst), 0);
    assert_eq!(replay_ticks.load(Ordering::SeqCst), 0);

    controller.start_recording(Some(1)).unwrap();
    controller.run_tick_hooks();
    controller.run_tick_hooks();
    assert_eq!(recording_ticks.load(Ordering::SeqCst), 2);
    controller
        .stop_recording(Some("r.txt"), 4, 0, "t", &mut store)
        .unwrap();

    controller.start_replay(Some("r.txt"), None, 10, &store).unwrap();
    controller.run_tick_hooks();
    assert_eq!(replay_ticks.load(Ordering::SeqCst), 1);

    let mut dispatcher = InputDispatcher::default();
    run_to_completion(&mut controller, &mut dispatcher, 10);
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    // Hooks stop firing once idle again.
    controller.run_tick_hooks();
    assert_eq!(recording_ticks.load(Ordering::SeqCst), 2);
    assert_eq!(replay_ticks.load(Ordering::SeqCst), 1);
}
