//! Live tracking, recording and replay behind one handle.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::error::ServiceError;
use crate::log::{list_logs, LogFileInfo};
use crate::orientation::{
    ChangeKind, ListenerSet, Location, OrientationReader, OrientationSample, OrientationSource,
    SharedListener, SpeedUnit,
};
use crate::recording::{RecordingConfig, RecordingOrientationSource};
use crate::replay::{ReplayOrientationSource, ReplayOutcome, SharedReplayListener};

/// The facade a user interface talks to.
///
/// Owns a recording-wrapped live source and at most one replay. Consumers
/// register listeners on the service and receive live events while no replay
/// is active, replayed events while one runs. When a replay ends on its own
/// the service falls back to live data.
///
/// # Thread Safety
///
/// All operations take `&self`. Replayed events are delivered on the replay
/// thread, live events on the sensor dispatch context.
pub struct RecorderService<S: OrientationSource + 'static> {
    /// Live source wrapped for recording.
    live: Arc<RecordingOrientationSource<S>>,

    /// Current or most recent replay.
    replay: Mutex<Option<Arc<ReplayOrientationSource>>>,

    /// Consumer listeners.
    listeners: Arc<ListenerSet>,

    /// Consumer replay-finished listeners, attached to every new replay.
    replay_listeners: Mutex<Vec<SharedReplayListener>>,

    /// Generation of the replay whose events reach consumers; 0 while live.
    replay_active: Arc<AtomicU64>,

    /// Last generation handed out by `start_replaying`.
    replay_generation: AtomicU64,

    /// Forwards live events unless a replay is active.
    live_forwarder: SharedListener,

    /// Forwards replayed events.
    replay_forwarder: SharedListener,

    /// Unit used to present location speed.
    speed_unit: RwLock<SpeedUnit>,
}

impl<S: OrientationSource + 'static> std::fmt::Debug for RecorderService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderService")
            .field("live", &self.live)
            .field("replay", &*self.replay.lock())
            .field("replay_active", &(self.replay_active.load(Ordering::SeqCst) != 0))
            .field("speed_unit", &*self.speed_unit.read())
            .finish()
    }
}

impl<S: OrientationSource + 'static> RecorderService<S> {
    /// Create a service over a live source. Nothing starts until `start()`.
    pub fn new(live: Arc<S>, recording: RecordingConfig) -> Self {
        let listeners = Arc::new(ListenerSet::new());
        let replay_active = Arc::new(AtomicU64::new(0));

        let live_forwarder: SharedListener = {
            let listeners = listeners.clone();
            let replay_active = replay_active.clone();
            Arc::new(move |kind: ChangeKind, source: &dyn OrientationReader| {
                if replay_active.load(Ordering::SeqCst) == 0 {
                    listeners.notify(kind, source);
                }
            })
        };
        let replay_forwarder: SharedListener = {
            let listeners = listeners.clone();
            Arc::new(move |kind: ChangeKind, source: &dyn OrientationReader| {
                listeners.notify(kind, source);
            })
        };

        let live = Arc::new(RecordingOrientationSource::new(live, recording));
        live.add_listener(live_forwarder.clone());

        Self {
            live,
            replay: Mutex::new(None),
            listeners,
            replay_listeners: Mutex::new(Vec::new()),
            replay_active,
            replay_generation: AtomicU64::new(0),
            live_forwarder,
            replay_forwarder,
            speed_unit: RwLock::new(SpeedUnit::default()),
        }
    }

    /// Set the initial speed unit.
    pub fn with_speed_unit(self, unit: SpeedUnit) -> Self {
        *self.speed_unit.write() = unit;
        self
    }

    /// The recording-wrapped live source.
    pub fn live(&self) -> &Arc<RecordingOrientationSource<S>> {
        &self.live
    }

    /// Directory logs are written to and replayed from.
    pub fn log_directory(&self) -> PathBuf {
        self.live.log_directory()
    }

    /// Begin recording the live stream.
    pub fn start_recording(&self) {
        self.live.start_recording();
    }

    /// Stop recording, if recording.
    pub fn stop_recording(&self) {
        self.live.stop_recording();
    }

    /// Path of the log being written.
    pub fn current_log(&self) -> Option<PathBuf> {
        self.live.current_log()
    }

    /// Replay a log from the log directory by file name.
    ///
    /// Stops any recording and any running replay first. While the replay
    /// runs, consumers receive its events instead of live ones.
    pub fn start_replaying(&self, name: &str) -> Result<(), ServiceError> {
        let path = self.resolve_log(name)?;
        self.stop_recording();
        self.stop_replaying();

        let replay = Arc::new(ReplayOrientationSource::open(&path)?);
        replay.add_listener(self.replay_forwarder.clone());
        let generation = self.replay_generation.fetch_add(1, Ordering::SeqCst) + 1;
        replay.add_finish_listener(self.finish_listener(generation));
        for listener in self.replay_listeners.lock().iter() {
            replay.add_finish_listener(listener.clone());
        }

        self.replay_active.store(generation, Ordering::SeqCst);
        *self.replay.lock() = Some(replay.clone());
        info!(path = %path.display(), "Replaying log");
        replay.start();
        Ok(())
    }

    /// Stop the running replay, if any, and return to live data.
    pub fn stop_replaying(&self) {
        let replay = self.replay.lock().clone();
        if let Some(replay) = replay {
            replay.stop();
        }
        self.replay_active.store(0, Ordering::SeqCst);
    }

    /// Register a listener for the end of every replay started afterwards.
    pub fn add_replay_listener(&self, listener: SharedReplayListener) {
        self.replay_listeners.lock().push(listener);
    }

    /// Logs available for replay, newest first.
    pub fn list_logs(&self) -> io::Result<Vec<LogFileInfo>> {
        list_logs(&self.log_directory())
    }

    pub fn speed_unit(&self) -> SpeedUnit {
        *self.speed_unit.read()
    }

    pub fn set_speed_unit(&self, unit: SpeedUnit) {
        *self.speed_unit.write() = unit;
    }

    /// Current location speed in the selected unit.
    pub fn display_speed(&self) -> Option<f32> {
        let unit = self.speed_unit();
        self.location().map(|l| unit.convert_mps(l.speed))
    }

    /// Returns consumers to live data when replay `generation` ends, unless a
    /// newer replay has taken over in the meantime.
    fn finish_listener(&self, generation: u64) -> SharedReplayListener {
        let replay_active = self.replay_active.clone();
        Arc::new(move |_: &ReplayOutcome| {
            let _ = replay_active.compare_exchange(
                generation,
                0,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        })
    }

    fn resolve_log(&self, name: &str) -> Result<PathBuf, ServiceError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.log_directory().join(name)),
            _ => Err(ServiceError::InvalidLogName(name.to_string())),
        }
    }

    /// The source consumers currently see.
    fn active(&self) -> Option<Arc<ReplayOrientationSource>> {
        if self.replay_active.load(Ordering::SeqCst) != 0 {
            self.replay.lock().clone()
        } else {
            None
        }
    }
}

impl<S: OrientationSource + 'static> OrientationReader for RecorderService<S> {
    fn heading(&self) -> f32 {
        self.snapshot().heading
    }

    fn pitch(&self) -> f32 {
        self.snapshot().pitch
    }

    fn roll(&self) -> f32 {
        self.snapshot().roll
    }

    fn has_interference(&self) -> bool {
        self.snapshot().has_interference
    }

    fn location(&self) -> Option<Location> {
        self.snapshot().location
    }

    fn is_recording(&self) -> bool {
        self.live.is_recording()
    }

    fn is_replaying(&self) -> bool {
        self.replay
            .lock()
            .as_ref()
            .map(|r| r.is_replaying())
            .unwrap_or(false)
    }

    fn snapshot(&self) -> OrientationSample {
        match self.active() {
            Some(replay) => replay.snapshot(),
            None => self.live.snapshot(),
        }
    }
}

impl<S: OrientationSource + 'static> OrientationSource for RecorderService<S> {
    fn add_listener(&self, listener: SharedListener) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &SharedListener) {
        self.listeners.remove(listener);
    }

    /// Start live tracking.
    fn start(&self) {
        self.live.start();
    }

    /// Stop any replay, then stop live tracking and recording.
    fn stop(&self) {
        self.stop_replaying();
        self.live.stop();
    }
}

impl<S: OrientationSource + 'static> Drop for RecorderService<S> {
    fn drop(&mut self) {
        self.live.remove_listener(&self.live_forwarder);
    }
}
