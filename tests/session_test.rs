//! Full sessions over replayed and in-memory pose streams

mod common;

use common::Pose;
use motion_map::dispatch::{InputAction, InputMapping, Key, RecordingInjector, SharedSettings};
use motion_map::pose::PoseFrame;
use motion_map::session::{MemorySource, PoseSource, ReplaySource, Session, SessionOptions};
use motion_map::time::timebase::Timestamp;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn jump_frames() -> Vec<PoseFrame> {
    vec![
        Pose::neutral().frame(0),
        Pose::neutral().frame(100),
        Pose::neutral().hands_up().frame(300),
        Pose::neutral().frame(400),
    ]
}

fn run(frames: Vec<PoseFrame>, settings: SharedSettings) -> (motion_map::SessionReport, Arc<RecordingInjector>) {
    let injector = Arc::new(RecordingInjector::new());
    let handle = Session::start(
        Box::new(MemorySource::new(frames)),
        injector.clone(),
        settings,
        SessionOptions::default(),
    )
    .unwrap();
    let report = handle.wait().unwrap();
    (report, injector)
}

#[test]
fn test_session_fires_and_releases() {
    let (report, injector) = run(jump_frames(), SharedSettings::default());

    assert_eq!(report.frames_read, 4);
    assert_eq!(report.frames_evaluated, 4);
    assert_eq!(report.gestures_fired, 1);
    assert_eq!(report.history.len(), 1);
    assert_eq!(report.history[0].gesture, "jump");
    assert!(report.history_summary.starts_with("jump"));

    // Released either by its timer or by the shutdown
    assert_eq!(
        injector.actions(),
        vec![
            InputAction::KeyDown { key: Key::Space },
            InputAction::KeyUp { key: Key::Space },
        ]
    );
}

#[test]
fn test_session_dry_run_injects_nothing() {
    let settings = SharedSettings::default();
    settings.set_keyboard_enabled(false);
    let (report, injector) = run(jump_frames(), settings);

    assert_eq!(report.gestures_fired, 1);
    assert_eq!(report.history.len(), 1);
    assert!(injector.actions().is_empty());
}

#[test]
fn test_inactive_mapping_disables_detection() {
    let settings = SharedSettings::default();
    let mut mapping = InputMapping::modifier(Key::Space);
    mapping.active = false;
    settings.set_mapping("jump", mapping);

    let (report, injector) = run(jump_frames(), settings);
    assert_eq!(report.gestures_fired, 0);
    assert!(report.history.is_empty());
    assert!(injector.actions().is_empty());
}

#[test]
fn test_frames_without_a_body_are_skipped() {
    let frames = vec![
        PoseFrame::empty(Timestamp::from_millis(0)),
        Pose::neutral().frame(33),
        PoseFrame::empty(Timestamp::from_millis(66)),
    ];
    let (report, _) = run(frames, SharedSettings::default());

    assert_eq!(report.frames_read, 3);
    assert_eq!(report.frames_skipped, 2);
    assert_eq!(report.frames_evaluated, 1);
}

#[test]
fn test_bad_frames_are_dropped_without_ending_the_session() {
    let mut nan = Pose::neutral().frame(200);
    if let Some(lm) = nan.landmarks.values_mut().next() {
        lm.pose[0] = f64::NAN;
    }

    let frames = vec![
        Pose::neutral().frame(100),
        // Regressed timestamp
        Pose::neutral().frame(50),
        nan,
        Pose::neutral().hands_up().frame(300),
    ];
    let (report, _) = run(frames, SharedSettings::default());

    assert_eq!(report.frames_read, 4);
    assert_eq!(report.frames_dropped, 2);
    assert_eq!(report.frames_evaluated, 2);
    assert_eq!(report.gestures_fired, 1);
}

#[test]
fn test_replay_file_session() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for frame in jump_frames() {
        writeln!(file, "{}", serde_json::to_string(&frame).unwrap()).unwrap();
    }
    writeln!(file).unwrap();
    writeln!(file, "{{ not a frame").unwrap();
    file.write_all(b"\xff\xfe\x00garbage\n").unwrap();
    writeln!(file, "{}", serde_json::to_string(&Pose::neutral().frame(500)).unwrap()).unwrap();
    file.flush().unwrap();

    let injector = Arc::new(RecordingInjector::new());
    let source = ReplaySource::open(file.path()).unwrap();
    let handle = Session::start(
        Box::new(source),
        injector.clone(),
        SharedSettings::default(),
        SessionOptions::default(),
    )
    .unwrap();
    let report = handle.wait().unwrap();

    // Lines after the malformed ones are still read
    assert_eq!(report.frames_read, 5);
    assert_eq!(report.gestures_fired, 1);
    assert_eq!(
        injector.actions().first(),
        Some(&InputAction::KeyDown { key: Key::Space })
    );
}

#[test]
fn test_missing_replay_file_is_a_source_error() {
    let err = ReplaySource::open("/nonexistent/frames.jsonl").err().unwrap();
    assert!(matches!(err, motion_map::Error::Source(_)));
}

/// Produces neutral frames until the session is stopped
struct EndlessSource {
    next: u64,
}

impl PoseSource for EndlessSource {
    fn next_frame(&mut self) -> motion_map::Result<Option<PoseFrame>> {
        std::thread::sleep(Duration::from_millis(2));
        let frame = Pose::neutral().left_knee_up().frame(self.next);
        self.next += 33;
        Ok(Some(frame))
    }
}

#[test]
fn test_stop_ends_a_live_session_and_releases_input() {
    let injector = Arc::new(RecordingInjector::new());
    let handle = Session::start(
        Box::new(EndlessSource { next: 0 }),
        injector.clone(),
        SharedSettings::default(),
        SessionOptions::default(),
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(100));
    assert!(!handle.is_finished());

    let report = handle.stop().unwrap();
    assert!(report.frames_read > 0);
    assert!(report.gestures_fired > 0);

    // Walking holds `w` across frames and is released exactly once at the end
    assert_eq!(
        injector.actions(),
        vec![
            InputAction::KeyDown { key: Key::Char('w') },
            InputAction::KeyUp { key: Key::Char('w') },
        ]
    );
}

#[test]
fn test_stop_signal_from_another_thread() {
    let handle = Session::start(
        Box::new(EndlessSource { next: 0 }),
        Arc::new(RecordingInjector::new()),
        SharedSettings::default(),
        SessionOptions::default(),
    )
    .unwrap();

    let signal = handle.stop_signal();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        signal.stop();
    });

    let report = handle.wait().unwrap();
    stopper.join().unwrap();
    assert!(report.frames_read > 0);
}
