//! Recording decorator over any orientation source.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::recorder::LogRecorder;
use crate::orientation::{
    ChangeKind, Location, OrientationReader, OrientationSample, OrientationSource, SharedListener,
};

/// Settings for [`RecordingOrientationSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingConfig {
    /// Directory logs are written to.
    pub directory: PathBuf,
    /// Start recording as part of `start()`.
    pub auto_record: bool,
}

impl RecordingConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            auto_record: false,
        }
    }

    pub fn with_auto_record(mut self, auto_record: bool) -> Self {
        self.auto_record = auto_record;
        self
    }
}

/// Wraps a source and writes each of its events to a log while recording.
///
/// Listener registration and all queries are delegated to the inner source;
/// listeners therefore observe exactly the inner source's events.
pub struct RecordingOrientationSource<S: OrientationSource> {
    inner: Arc<S>,
    recorder: Arc<LogRecorder>,
    recorder_listener: SharedListener,
    auto_record: bool,
    started: AtomicBool,
}

impl<S: OrientationSource> std::fmt::Debug for RecordingOrientationSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingOrientationSource")
            .field("recorder", &self.recorder)
            .field("auto_record", &self.auto_record)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}

impl<S: OrientationSource> RecordingOrientationSource<S> {
    /// Wrap `inner`. Nothing is recorded until `start_recording()`, or
    /// `start()` with auto-record enabled.
    pub fn new(inner: Arc<S>, config: RecordingConfig) -> Self {
        let recorder = Arc::new(LogRecorder::new(config.directory));
        let recorder_listener: SharedListener = {
            let recorder = recorder.clone();
            Arc::new(move |kind: ChangeKind, source: &dyn OrientationReader| {
                recorder.record(kind, source);
            })
        };

        Self {
            inner,
            recorder,
            recorder_listener,
            auto_record: config.auto_record,
            started: AtomicBool::new(false),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Open a new log unless one is already open.
    pub fn start_recording(&self) {
        self.recorder.start();
    }

    /// Flush and close the current log, if any.
    pub fn stop_recording(&self) {
        self.recorder.stop();
    }

    /// Path of the log being written.
    pub fn current_log(&self) -> Option<PathBuf> {
        self.recorder.current_log()
    }

    /// Directory logs are written to.
    pub fn log_directory(&self) -> PathBuf {
        self.recorder.directory().to_path_buf()
    }
}

impl<S: OrientationSource> OrientationReader for RecordingOrientationSource<S> {
    fn heading(&self) -> f32 {
        self.inner.heading()
    }

    fn pitch(&self) -> f32 {
        self.inner.pitch()
    }

    fn roll(&self) -> f32 {
        self.inner.roll()
    }

    fn has_interference(&self) -> bool {
        self.inner.has_interference()
    }

    fn location(&self) -> Option<Location> {
        self.inner.location()
    }

    fn has_location(&self) -> bool {
        self.inner.has_location()
    }

    fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    fn is_replaying(&self) -> bool {
        self.inner.is_replaying()
    }

    fn snapshot(&self) -> OrientationSample {
        self.inner.snapshot()
    }
}

impl<S: OrientationSource> OrientationSource for RecordingOrientationSource<S> {
    fn add_listener(&self, listener: SharedListener) {
        self.inner.add_listener(listener);
    }

    fn remove_listener(&self, listener: &SharedListener) {
        self.inner.remove_listener(listener);
    }

    fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.auto_record {
            self.recorder.start();
        }
        self.inner.add_listener(self.recorder_listener.clone());
        self.inner.start();

        // Open the log with a location baseline when one is known.
        if self.inner.has_location() {
            self.recorder.record(ChangeKind::Location, &*self.inner);
        }
        debug!(auto_record = self.auto_record, "Recording source started");
    }

    fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        self.recorder.stop();
        self.inner.remove_listener(&self.recorder_listener);
        self.inner.stop();
        debug!("Recording source stopped");
    }
}
