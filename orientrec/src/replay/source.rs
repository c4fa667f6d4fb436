//! Orientation source that reproduces a log with its original timing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::error::{ReplayError, ReplayOutcome};
use super::signal::CancelSignal;
use crate::log::{LogEvent, LogRecord};
use crate::orientation::{
    same_handle, ListenerSet, Location, OrientationReader, OrientationSample, OrientationSource,
    SharedListener,
};

/// Name of the replay worker thread.
pub const REPLAY_THREAD_NAME: &str = "orientation-replay";

/// Notified once when a replay run ends, however it ends.
///
/// Called on the replay thread, or on the caller's thread if the worker
/// could not be spawned.
pub trait ReplayListener: Send + Sync {
    fn on_replay_finished(&self, outcome: &ReplayOutcome);
}

impl<F> ReplayListener for F
where
    F: Fn(&ReplayOutcome) + Send + Sync,
{
    fn on_replay_finished(&self, outcome: &ReplayOutcome) {
        self(outcome)
    }
}

/// Shared handle to a replay listener.
pub type SharedReplayListener = Arc<dyn ReplayListener>;

/// Lifecycle of a replay source. A source runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    Idle,
    Running,
    /// Ended on its own: end of input, blank line or bad input.
    Finished,
    /// Ended by `stop()`.
    Stopped,
}

type LogInput = Box<dyn BufRead + Send>;

struct ReplayShared {
    state: RwLock<OrientationSample>,
    listeners: ListenerSet,
    finish_listeners: Mutex<Vec<SharedReplayListener>>,
    phase: Mutex<ReplayPhase>,
    active: AtomicBool,
    cancel: CancelSignal,
}

impl ReplayShared {
    fn apply(&self, event: LogEvent) {
        let mut state = self.state.write();
        match event {
            LogEvent::Orientation {
                heading,
                pitch,
                roll,
            } => {
                state.heading = heading;
                state.pitch = pitch;
                state.roll = roll;
            }
            LogEvent::Location(location) => state.location = Some(location),
            LogEvent::Accuracy { has_interference } => state.has_interference = has_interference,
        }
    }

    /// Replay lines until the input ends, fails or the run is cancelled.
    fn run(&self, mut input: LogInput) -> ReplayOutcome {
        let started = Instant::now();
        let mut line = String::new();
        let mut line_number = 0;

        loop {
            if self.cancel.is_cancelled() {
                return ReplayOutcome::Stopped;
            }

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => return ReplayOutcome::Completed,
                Ok(_) => {}
                Err(e) => return ReplayError::Read(e).into(),
            }
            line_number += 1;

            if line.trim().is_empty() {
                return ReplayOutcome::Completed;
            }
            let record: LogRecord = match line.parse() {
                Ok(record) => record,
                Err(source) => {
                    return ReplayError::Malformed {
                        line: line_number,
                        source,
                    }
                    .into()
                }
            };

            let due = started + Duration::from_millis(record.offset_ms);
            if self.cancel.sleep_until(due) {
                return ReplayOutcome::Stopped;
            }

            self.apply(record.event);
            self.listeners.notify(record.kind(), self);
        }
    }

    fn finish(&self, outcome: ReplayOutcome) {
        self.active.store(false, Ordering::SeqCst);
        *self.phase.lock() = if outcome.is_stopped() {
            ReplayPhase::Stopped
        } else {
            ReplayPhase::Finished
        };

        match outcome.error() {
            Some(e) => info!(error = %e, "Replay ended on bad input"),
            None => info!(%outcome, "Replay finished"),
        }

        let listeners: Vec<SharedReplayListener> = self.finish_listeners.lock().clone();
        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_replay_finished(&outcome)));
            if result.is_err() {
                error!("Replay listener panicked; continuing with the rest");
            }
        }
    }
}

impl OrientationReader for ReplayShared {
    fn heading(&self) -> f32 {
        self.state.read().heading
    }

    fn pitch(&self) -> f32 {
        self.state.read().pitch
    }

    fn roll(&self) -> f32 {
        self.state.read().roll
    }

    fn has_interference(&self) -> bool {
        self.state.read().has_interference
    }

    fn location(&self) -> Option<Location> {
        self.state.read().location
    }

    fn is_replaying(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> OrientationSample {
        *self.state.read()
    }
}

/// Replays a log on a dedicated thread.
///
/// Each line is applied and notified once real time since `start()` has
/// caught up with its offset. Lines are delivered strictly in file order.
/// Listeners are invoked on the replay thread.
///
/// # Lifecycle
///
/// `Idle → Running → Finished | Stopped`. A source runs once; `start()` in
/// any phase but `Idle` does nothing. [`ReplayListener`]s hear about the end
/// exactly once, whether the input ran out, was malformed, or `stop()` was
/// called.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use std::sync::mpsc;
/// use orientrec::orientation::{OrientationReader, OrientationSource};
/// use orientrec::replay::{ReplayOrientationSource, ReplayOutcome};
///
/// let replay = ReplayOrientationSource::from_reader(Cursor::new("0,O,10.0,5.0,1.0\n"));
/// let (tx, rx) = mpsc::channel();
/// let tx = std::sync::Mutex::new(tx);
/// replay.add_finish_listener(Arc::new(move |outcome: &ReplayOutcome| {
///     let _ = tx.lock().unwrap().send(outcome.is_completed());
/// }));
/// replay.start();
/// assert!(rx.recv().unwrap());
/// assert_eq!(replay.heading(), 10.0);
/// ```
pub struct ReplayOrientationSource {
    shared: Arc<ReplayShared>,
    input: Mutex<Option<LogInput>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ReplayOrientationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayOrientationSource")
            .field("path", &self.path)
            .field("phase", &self.phase())
            .finish()
    }
}

impl ReplayOrientationSource {
    /// Open a log file for replay.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut source = Self::from_reader(BufReader::new(file));
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    /// Replay from any buffered reader.
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            shared: Arc::new(ReplayShared {
                state: RwLock::new(OrientationSample::default()),
                listeners: ListenerSet::new(),
                finish_listeners: Mutex::new(Vec::new()),
                phase: Mutex::new(ReplayPhase::Idle),
                active: AtomicBool::new(false),
                cancel: CancelSignal::new(),
            }),
            input: Mutex::new(Some(Box::new(reader))),
            worker: Mutex::new(None),
            path: None,
        }
    }

    /// The file being replayed, when opened from a path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn phase(&self) -> ReplayPhase {
        *self.shared.phase.lock()
    }

    /// Register a finish listener. Adding the same listener twice has no effect.
    pub fn add_finish_listener(&self, listener: SharedReplayListener) {
        let mut listeners = self.shared.finish_listeners.lock();
        if !listeners.iter().any(|l| same_handle(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn remove_finish_listener(&self, listener: &SharedReplayListener) {
        self.shared
            .finish_listeners
            .lock()
            .retain(|l| !same_handle(l, listener));
    }

    /// Block until the replay thread has exited.
    pub fn wait(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            } else {
                *self.worker.lock() = Some(handle);
            }
        }
    }
}

impl OrientationReader for ReplayOrientationSource {
    fn heading(&self) -> f32 {
        self.shared.heading()
    }

    fn pitch(&self) -> f32 {
        self.shared.pitch()
    }

    fn roll(&self) -> f32 {
        self.shared.roll()
    }

    fn has_interference(&self) -> bool {
        self.shared.has_interference()
    }

    fn location(&self) -> Option<Location> {
        self.shared.location()
    }

    fn is_replaying(&self) -> bool {
        self.shared.is_replaying()
    }

    fn snapshot(&self) -> OrientationSample {
        self.shared.snapshot()
    }
}

impl OrientationSource for ReplayOrientationSource {
    fn add_listener(&self, listener: SharedListener) {
        self.shared.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &SharedListener) {
        self.shared.listeners.remove(listener);
    }

    fn start(&self) {
        {
            let mut phase = self.shared.phase.lock();
            if *phase != ReplayPhase::Idle {
                return;
            }
            *phase = ReplayPhase::Running;
        }
        let Some(input) = self.input.lock().take() else {
            return;
        };
        self.shared.active.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(REPLAY_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = shared.run(input);
                shared.finish(outcome);
            });

        match spawned {
            Ok(handle) => {
                info!(path = ?self.path, "Replay started");
                *self.worker.lock() = Some(handle);
            }
            Err(e) => self.shared.finish(ReplayError::Spawn(e).into()),
        }
    }

    fn stop(&self) {
        if *self.shared.phase.lock() != ReplayPhase::Running {
            return;
        }
        debug!("Stopping replay");
        self.shared.cancel.cancel();
        self.shared.active.store(false, Ordering::SeqCst);
        self.wait();
    }
}

impl Drop for ReplayOrientationSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::ChangeKind;
    use std::io::{self, Cursor, Read};
    use std::sync::mpsc;

    fn replay(contents: &str) -> ReplayOrientationSource {
        ReplayOrientationSource::from_reader(Cursor::new(contents.to_string()))
    }

    /// Finish listener that forwards outcomes to a channel.
    fn finish_channel(source: &ReplayOrientationSource) -> mpsc::Receiver<ReplayOutcome> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        source.add_finish_listener(Arc::new(move |outcome: &ReplayOutcome| {
            let _ = tx.lock().send(outcome.clone());
        }));
        rx
    }

    fn event_log(source: &ReplayOrientationSource) -> Arc<Mutex<Vec<ChangeKind>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener: SharedListener = {
            let seen = seen.clone();
            Arc::new(move |kind: ChangeKind, _: &dyn OrientationReader| seen.lock().push(kind))
        };
        source.add_listener(listener);
        seen
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_replays_events_in_order() {
        let source = replay(
            "0,L,47.6,-122.3,50.0,90.0,1.5,4.0\n\
             0,O,10.0,5.0,1.0\n\
             5,A,true\n\
             10,O,20.0,-5.0,2.0\n",
        );
        let seen = event_log(&source);
        let finished = finish_channel(&source);

        source.start();
        let outcome = finished.recv_timeout(TIMEOUT).unwrap();
        assert!(outcome.is_completed());

        assert_eq!(
            *seen.lock(),
            vec![
                ChangeKind::Location,
                ChangeKind::Orientation,
                ChangeKind::Accuracy,
                ChangeKind::Orientation
            ]
        );
        assert_eq!(source.heading(), 20.0);
        assert_eq!(source.pitch(), -5.0);
        assert_eq!(source.roll(), 2.0);
        assert!(source.has_interference());
        let location = source.location().unwrap();
        assert_eq!(location.latitude, 47.6);
        assert!(location.time.is_none());
        assert_eq!(source.phase(), ReplayPhase::Finished);
    }

    #[test]
    fn test_empty_input_finishes_without_events() {
        for contents in ["", "   \n", "\n0,O,1.0,2.0,3.0\n"] {
            let source = replay(contents);
            let seen = event_log(&source);
            let finished = finish_channel(&source);

            source.start();
            assert!(finished.recv_timeout(TIMEOUT).unwrap().is_completed());
            assert!(seen.lock().is_empty());
            source.wait();
            assert!(!source.is_replaying());
        }
    }

    #[test]
    fn test_malformed_line_ends_run() {
        let source = replay("0,O,1.0,2.0,3.0\n1,O,bad,2.0,3.0\n2,A,true\n");
        let seen = event_log(&source);
        let finished = finish_channel(&source);

        source.start();
        let outcome = finished.recv_timeout(TIMEOUT).unwrap();
        match outcome.error() {
            Some(ReplayError::Malformed { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(*seen.lock(), vec![ChangeKind::Orientation]);
        assert_eq!(source.phase(), ReplayPhase::Finished);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_read_error_ends_run() {
        let source = ReplayOrientationSource::from_reader(io::BufReader::new(FailingReader));
        let finished = finish_channel(&source);
        source.start();
        let outcome = finished.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(outcome.error(), Some(ReplayError::Read(_))));
    }

    #[test]
    fn test_stop_interrupts_sleep() {
        let source = replay("0,O,1.0,2.0,3.0\n60000,O,4.0,5.0,6.0\n");
        let seen = event_log(&source);
        let finished = finish_channel(&source);

        source.start();
        // Wait for the first event.
        let deadline = Instant::now() + TIMEOUT;
        while seen.lock().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(source.is_replaying());

        let stop_started = Instant::now();
        source.stop();
        assert!(stop_started.elapsed() < Duration::from_secs(5));
        assert!(!source.is_replaying());
        assert_eq!(source.phase(), ReplayPhase::Stopped);

        assert!(finished.recv_timeout(TIMEOUT).unwrap().is_stopped());
        assert!(finished.try_recv().is_err());
        assert_eq!(*seen.lock(), vec![ChangeKind::Orientation]);
        assert_eq!(source.heading(), 1.0);
    }

    #[test]
    fn test_runs_only_once() {
        let source = replay("0,A,true\n");
        let seen = event_log(&source);
        let finished = finish_channel(&source);

        source.start();
        source.start();
        finished.recv_timeout(TIMEOUT).unwrap();
        source.wait();
        source.start();
        thread::sleep(Duration::from_millis(20));

        assert_eq!(seen.lock().len(), 1);
        assert!(finished.try_recv().is_err());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let source = replay("0,A,true\n");
        let finished = finish_channel(&source);
        source.stop();
        assert_eq!(source.phase(), ReplayPhase::Idle);
        assert!(finished.try_recv().is_err());

        source.start();
        assert!(finished.recv_timeout(TIMEOUT).unwrap().is_completed());
    }

    #[test]
    fn test_listener_can_stop_replay_from_callback() {
        let source = Arc::new(replay("0,O,1.0,0.0,0.0\n0,O,2.0,0.0,0.0\n0,O,3.0,0.0,0.0\n"));
        let finished = finish_channel(&source);
        let count = Arc::new(Mutex::new(0));
        {
            let weak = Arc::downgrade(&source);
            let count = count.clone();
            source.add_listener(Arc::new(move |_: ChangeKind, _: &dyn OrientationReader| {
                *count.lock() += 1;
                if let Some(source) = weak.upgrade() {
                    source.stop();
                }
            }));
        }

        source.start();
        assert!(finished.recv_timeout(TIMEOUT).unwrap().is_stopped());
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let result = ReplayOrientationSource::open("/nonexistent/dir/1.om");
        assert!(matches!(result, Err(ReplayError::Open { .. })));
    }
}
