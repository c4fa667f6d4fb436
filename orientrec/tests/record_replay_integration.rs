//! Integration tests for the record → replay pipeline.
//!
//! These tests drive a live sensor source from a mock hub through the
//! recording decorator, then replay the produced logs and check:
//! - Event kinds, values and order survive the round trip
//! - The log holds exactly one line per observed event
//! - Replay honours line offsets and reports `is_replaying()` correctly
//! - Empty input, double start and early stop behave as no-ops
//!
//! Run with: `cargo test --test record_replay_integration`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tempfile::TempDir;

use orientrec::log::{list_logs, LogEvent, LogRecord};
use orientrec::orientation::{
    ChangeKind, Location, OrientationReader, OrientationSample, OrientationSource, SharedListener,
};
use orientrec::recording::{RecordingConfig, RecordingOrientationSource};
use orientrec::replay::{ReplayOrientationSource, ReplayOutcome};
use orientrec::sensors::{
    MockSensorHub, SensorAccuracy, SensorKind, SensorOrientationSource, SensorSourceConfig,
};

// ============================================================================
// Helper Functions
// ============================================================================

const TIMEOUT: Duration = Duration::from_secs(10);

type Observed = Arc<Mutex<Vec<(ChangeKind, OrientationSample, Instant)>>>;

/// Listener that captures every notification with the values it saw.
fn observer() -> (SharedListener, Observed) {
    let observed: Observed = Arc::new(Mutex::new(Vec::new()));
    let listener: SharedListener = {
        let observed = observed.clone();
        Arc::new(move |kind: ChangeKind, source: &dyn OrientationReader| {
            observed
                .lock()
                .unwrap()
                .push((kind, source.snapshot(), Instant::now()));
        })
    };
    (listener, observed)
}

fn finish_channel(replay: &ReplayOrientationSource) -> mpsc::Receiver<ReplayOutcome> {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    replay.add_finish_listener(Arc::new(move |outcome: &ReplayOutcome| {
        let _ = tx.lock().unwrap().send(outcome.clone());
    }));
    rx
}

fn recording_source(
    hub: &Arc<MockSensorHub>,
    dir: &Path,
) -> RecordingOrientationSource<SensorOrientationSource> {
    let live = Arc::new(SensorOrientationSource::new(
        hub.clone(),
        hub.clone(),
        SensorSourceConfig::default(),
    ));
    RecordingOrientationSource::new(live, RecordingConfig::new(dir))
}

/// Drive a short session with every event kind.
fn drive_session(hub: &MockSensorHub) {
    hub.emit_location(
        Location::new(47.6062, -122.3321, 56.0)
            .with_motion(270.0, 1.25, 4.0)
            .with_time(Utc::now()),
    );
    hub.emit_attitude(120.0, 12.5);
    hub.emit_gravity(1.5, 9.5, 0.5);
    hub.emit_accuracy(SensorKind::MagneticField, SensorAccuracy::Low);
    hub.emit_attitude(-45.0, -20.0);
    hub.emit_accuracy(SensorKind::MagneticField, SensorAccuracy::High);
    hub.emit_location(
        Location::new(47.6070, -122.3330, 57.5)
            .with_motion(265.5, 1.5, 3.0)
            .with_time(Utc::now()),
    );
}

fn record_session(dir: &Path) -> (PathBuf, Vec<(ChangeKind, OrientationSample)>) {
    let hub = Arc::new(MockSensorHub::new());
    let source = recording_source(&hub, dir);
    source.start();
    source.start_recording();
    let path = source.current_log().expect("recording should have opened a log");

    let (listener, observed) = observer();
    source.add_listener(listener);
    drive_session(&hub);
    source.stop();

    let observed = observed
        .lock()
        .unwrap()
        .iter()
        .map(|(kind, sample, _)| (*kind, *sample))
        .collect();
    (path, observed)
}

/// The fields a log line carries for an event of `kind`, without fix times.
fn logged_fields(kind: ChangeKind, sample: &OrientationSample) -> Option<LogEvent> {
    match LogEvent::capture(kind, sample)? {
        LogEvent::Location(mut location) => {
            location.time = None;
            Some(LogEvent::Location(location))
        }
        event => Some(event),
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Recording then replaying reproduces every event's kind and values in order.
#[test]
fn test_record_then_replay_round_trip() {
    let temp = TempDir::new().unwrap();
    let (path, recorded) = record_session(temp.path());
    assert_eq!(recorded.len(), 7);

    let replay = ReplayOrientationSource::open(&path).unwrap();
    let (listener, observed) = observer();
    replay.add_listener(listener);
    let finished = finish_channel(&replay);

    replay.start();
    assert!(finished.recv_timeout(TIMEOUT).unwrap().is_completed());

    let replayed = observed.lock().unwrap();
    assert_eq!(replayed.len(), recorded.len());
    for ((kind, live), (replayed_kind, replayed, _)) in recorded.iter().zip(replayed.iter()) {
        assert_eq!(kind, replayed_kind);
        assert_eq!(
            logged_fields(*kind, live),
            logged_fields(*replayed_kind, replayed)
        );
    }

    // Replayed fixes keep position and motion but carry no time.
    let location = replay.location().unwrap();
    assert_eq!(location.latitude, 47.6070);
    assert_eq!(location.bearing, 265.5);
    assert!(location.time.is_none());
}

/// The log holds one line per event observed during the recording window.
#[test]
fn test_line_count_matches_observed_events() {
    let temp = TempDir::new().unwrap();
    let hub = Arc::new(MockSensorHub::new());
    let source = recording_source(&hub, temp.path());
    source.start();

    // Events outside the window are not counted.
    hub.emit_attitude(10.0, 0.0);

    let (listener, observed) = observer();
    source.add_listener(listener.clone());
    source.start_recording();
    let path = source.current_log().unwrap();
    drive_session(&hub);
    hub.emit_gravity(0.0, 9.81, 0.0);
    source.stop_recording();
    source.remove_listener(&listener);

    hub.emit_attitude(20.0, 0.0);
    source.stop();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), observed.lock().unwrap().len());
    assert_eq!(lines.len(), 8);

    // Offsets never decrease.
    let offsets: Vec<u64> = lines
        .iter()
        .map(|line| line.parse::<LogRecord>().unwrap().offset_ms)
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
}

/// Replay of a two-line log honours the 500 ms offset of the second line.
#[test]
fn test_replay_timing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("1700000000000.om");
    fs::write(&path, "0,O,10.0,5.0,1.0\n500,A,true\n").unwrap();

    let replay = Arc::new(ReplayOrientationSource::open(&path).unwrap());
    let (listener, observed) = observer();
    replay.add_listener(listener);

    // Record `is_replaying()` as each event is delivered.
    let replaying_during_events = Arc::new(Mutex::new(Vec::new()));
    {
        let weak = Arc::downgrade(&replay);
        let replaying = replaying_during_events.clone();
        replay.add_listener(Arc::new(move |_: ChangeKind, _: &dyn OrientationReader| {
            if let Some(source) = weak.upgrade() {
                replaying.lock().unwrap().push(source.is_replaying());
            }
        }));
    }
    let finished = finish_channel(&replay);

    let started = Instant::now();
    replay.start();

    // Strictly between the two events the source is replaying.
    thread::sleep(Duration::from_millis(250));
    assert!(replay.is_replaying());

    assert!(finished.recv_timeout(TIMEOUT).unwrap().is_completed());
    replay.wait();
    assert!(!replay.is_replaying());

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 2);
    let (first_kind, first, first_at) = observed[0];
    let (second_kind, second, second_at) = observed[1];

    assert_eq!(first_kind, ChangeKind::Orientation);
    assert_eq!((first.heading, first.pitch, first.roll), (10.0, 5.0, 1.0));
    assert!(first_at.duration_since(started) < Duration::from_millis(250));

    assert_eq!(second_kind, ChangeKind::Accuracy);
    assert!(second.has_interference);
    let gap = second_at.duration_since(started);
    assert!(gap >= Duration::from_millis(500), "second event after {:?}", gap);
    assert!(gap < Duration::from_millis(2000), "second event after {:?}", gap);

    assert_eq!(*replaying_during_events.lock().unwrap(), vec![true, true]);
}

/// Empty and whitespace-only logs finish immediately without events.
#[test]
fn test_empty_logs_finish_immediately() {
    let temp = TempDir::new().unwrap();
    for (index, contents) in ["", "\n", "  \t \n\n"].iter().enumerate() {
        let path = temp.path().join(format!("{}.om", index));
        fs::write(&path, contents).unwrap();

        let replay = ReplayOrientationSource::open(&path).unwrap();
        let (listener, observed) = observer();
        replay.add_listener(listener);
        let finished = finish_channel(&replay);

        let started = Instant::now();
        replay.start();
        assert!(finished.recv_timeout(TIMEOUT).unwrap().is_completed());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(observed.lock().unwrap().is_empty());
    }
}

/// Starting twice yields one sensor registration set and one log file.
#[test]
fn test_double_start_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let hub = Arc::new(MockSensorHub::new());
    let live = Arc::new(SensorOrientationSource::new(
        hub.clone(),
        hub.clone(),
        SensorSourceConfig::default(),
    ));
    let source = RecordingOrientationSource::new(
        live,
        RecordingConfig::new(temp.path()).with_auto_record(true),
    );

    source.start();
    source.start();
    assert_eq!(hub.registration_count(), 3);
    assert_eq!(hub.location_request_count(), 1);

    hub.emit_attitude(30.0, 0.0);
    source.stop();

    let logs = list_logs(temp.path()).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(fs::read_to_string(&logs[0].path).unwrap().lines().count(), 1);
}

/// Stop before start is a no-op for every source.
#[test]
fn test_stop_before_start_is_noop() {
    let temp = TempDir::new().unwrap();
    let hub = Arc::new(MockSensorHub::new());

    let live = SensorOrientationSource::new(hub.clone(), hub.clone(), SensorSourceConfig::default());
    live.stop();
    assert!(!live.is_tracking());

    let recording = recording_source(&hub, temp.path());
    recording.stop();
    assert!(!recording.is_recording());

    let path = temp.path().join("1.om");
    fs::write(&path, "0,A,true\n").unwrap();
    let replay = ReplayOrientationSource::open(&path).unwrap();
    let finished = finish_channel(&replay);
    replay.stop();
    assert!(!replay.is_replaying());
    assert!(finished.try_recv().is_err());

    assert_eq!(hub.registration_count(), 0);
    assert!(list_logs(temp.path()).unwrap().iter().all(|l| l.name == "1.om"));
}

/// A removed listener hears nothing while others still do.
#[test]
fn test_removed_listener_is_silent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("1.om");
    fs::write(&path, "0,O,1.0,2.0,3.0\n0,A,true\n0,O,4.0,5.0,6.0\n").unwrap();

    let replay = ReplayOrientationSource::open(&path).unwrap();
    let (removed, removed_seen) = observer();
    let (kept, kept_seen) = observer();
    replay.add_listener(removed.clone());
    replay.add_listener(kept);
    replay.remove_listener(&removed);
    let finished = finish_channel(&replay);

    replay.start();
    finished.recv_timeout(TIMEOUT).unwrap();

    assert!(removed_seen.lock().unwrap().is_empty());
    assert_eq!(kept_seen.lock().unwrap().len(), 3);
}
