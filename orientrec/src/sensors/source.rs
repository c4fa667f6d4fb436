//! Live orientation source backed by platform sensors.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::fusion::{attitude_from_rotation_vector, roll_from_gravity};
use super::input::{
    LocationListener, LocationProvider, LocationRequest, SensorAccuracy, SensorDelay, SensorHub,
    SensorKind, SensorListener, SensorReading,
};
use crate::geomag::{GeomagneticField, HeadingCorrection, DEFAULT_MECHANICAL_OFFSET_DEG};
use crate::orientation::{
    ChangeKind, ListenerSet, Location, OrientationReader, OrientationSample, OrientationSource,
    SharedListener,
};

/// Default maximum age of a cached fix used to seed a fresh start.
pub const DEFAULT_MAX_LOCATION_AGE: Duration = Duration::from_secs(30 * 60);

/// Tunables for [`SensorOrientationSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSourceConfig {
    /// Bias subtracted from every heading to compensate for the sensor mount.
    pub mechanical_offset_deg: f32,
    /// Last-known fixes older than this are not used to seed a start.
    pub max_location_age: Duration,
    /// Thresholds for periodic location updates.
    pub location_request: LocationRequest,
    /// Sampling rate requested for all three sensors.
    pub sensor_delay: SensorDelay,
}

impl Default for SensorSourceConfig {
    fn default() -> Self {
        Self {
            mechanical_offset_deg: DEFAULT_MECHANICAL_OFFSET_DEG,
            max_location_age: DEFAULT_MAX_LOCATION_AGE,
            location_request: LocationRequest::default(),
            sensor_delay: SensorDelay::default(),
        }
    }
}

/// State shared between the source and its input callbacks.
struct SensorShared {
    state: RwLock<OrientationSample>,
    correction: RwLock<HeadingCorrection>,
    listeners: ListenerSet,
}

impl SensorShared {
    fn apply_location(&self, location: Location) {
        let time = location.time.unwrap_or_else(Utc::now);
        let field = GeomagneticField::new(
            location.latitude,
            location.longitude,
            location.altitude,
            time,
        );
        {
            let mut correction = self.correction.write();
            *correction = correction.with_field(&field);
        }
        self.state.write().location = Some(location);
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            declination = field.declination(),
            "Location applied"
        );
    }

    fn notify(&self, kind: ChangeKind) {
        self.listeners.notify(kind, self);
    }
}

impl OrientationReader for SensorShared {
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

    fn snapshot(&self) -> OrientationSample {
        *self.state.read()
    }
}

/// Adapter registered with the platform; forwards callbacks into the shared state.
struct SensorCallbacks {
    shared: Arc<SensorShared>,
}

impl SensorListener for SensorCallbacks {
    fn on_sensor_changed(&self, reading: &SensorReading) {
        match *reading {
            SensorReading::RotationVector { x, y, z, w } => {
                let attitude = attitude_from_rotation_vector(x, y, z, w);
                let heading = self
                    .shared
                    .correction
                    .read()
                    .true_heading(attitude.azimuth_deg);
                {
                    let mut state = self.shared.state.write();
                    state.heading = heading;
                    state.pitch = attitude.pitch_deg;
                }
                self.shared.notify(ChangeKind::Orientation);
            }
            SensorReading::Gravity { x, y, z } => {
                self.shared.state.write().roll = roll_from_gravity(x, y, z);
                self.shared.notify(ChangeKind::Orientation);
            }
            // Only the accuracy of the magnetometer is of interest.
            SensorReading::MagneticField { .. } => {}
        }
    }

    fn on_accuracy_changed(&self, kind: SensorKind, accuracy: SensorAccuracy) {
        if kind != SensorKind::MagneticField {
            return;
        }
        let interference = accuracy < SensorAccuracy::High;
        self.shared.state.write().has_interference = interference;
        debug!(?accuracy, interference, "Magnetometer accuracy changed");
        self.shared.notify(ChangeKind::Accuracy);
    }
}

impl LocationListener for SensorCallbacks {
    fn on_location_changed(&self, location: Location) {
        self.shared.apply_location(location);
        self.shared.notify(ChangeKind::Location);
    }
}

/// Orientation source fed by a [`SensorHub`] and a [`LocationProvider`].
///
/// Heading comes from the rotation vector, corrected for declination and the
/// mechanical offset; roll comes from gravity; the interference flag follows
/// the magnetometer accuracy. Cached values survive `stop()` and are reused
/// on the next `start()`.
///
/// Callbacks are expected to arrive sequentially on one dispatch context.
pub struct SensorOrientationSource {
    shared: Arc<SensorShared>,
    sensor_callbacks: Arc<dyn SensorListener>,
    location_callbacks: Arc<dyn LocationListener>,
    hub: Arc<dyn SensorHub>,
    locations: Arc<dyn LocationProvider>,
    provider: Option<String>,
    config: SensorSourceConfig,
    tracking: Mutex<bool>,
}

impl std::fmt::Debug for SensorOrientationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorOrientationSource")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .field("tracking", &self.is_tracking())
            .finish()
    }
}

impl SensorOrientationSource {
    /// Create a stopped source. The best location provider is resolved now.
    pub fn new(
        hub: Arc<dyn SensorHub>,
        locations: Arc<dyn LocationProvider>,
        config: SensorSourceConfig,
    ) -> Self {
        let shared = Arc::new(SensorShared {
            state: RwLock::new(OrientationSample::default()),
            correction: RwLock::new(HeadingCorrection::new(config.mechanical_offset_deg)),
            listeners: ListenerSet::new(),
        });
        let callbacks = Arc::new(SensorCallbacks {
            shared: shared.clone(),
        });
        let provider = locations.best_provider();
        if provider.is_none() {
            warn!("No location provider available; heading stays uncorrected for declination");
        }

        Self {
            shared,
            sensor_callbacks: callbacks.clone(),
            location_callbacks: callbacks,
            hub,
            locations,
            provider,
            config,
            tracking: Mutex::new(false),
        }
    }

    /// Whether sensor callbacks are currently registered.
    pub fn is_tracking(&self) -> bool {
        *self.tracking.lock()
    }

    /// The correction currently applied to headings.
    pub fn correction(&self) -> HeadingCorrection {
        *self.shared.correction.read()
    }

    /// Seed location and declination from the platform's cached fix.
    ///
    /// The fix must carry a time, be younger than the configured age and not
    /// be older than the fix already held. No event is emitted.
    fn seed_last_known_location(&self) {
        let Some(candidate) = self.locations.last_known_location() else {
            return;
        };
        let Some(time) = candidate.time else {
            debug!("Ignoring last-known location without a fix time");
            return;
        };

        let age = Utc::now().signed_duration_since(time);
        let too_old = age
            .to_std()
            .map(|age| age > self.config.max_location_age)
            .unwrap_or(false);
        if too_old {
            debug!(age_secs = age.num_seconds(), "Ignoring stale last-known location");
            return;
        }

        let current = self.shared.location();
        let superseded = matches!(current.and_then(|l| l.time), Some(held) if held > time);
        if superseded {
            return;
        }

        self.shared.apply_location(candidate);
    }
}

impl OrientationReader for SensorOrientationSource {
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

    fn snapshot(&self) -> OrientationSample {
        self.shared.snapshot()
    }
}

impl OrientationSource for SensorOrientationSource {
    fn add_listener(&self, listener: SharedListener) {
        self.shared.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &SharedListener) {
        self.shared.listeners.remove(listener);
    }

    fn start(&self) {
        let mut tracking = self.tracking.lock();
        if *tracking {
            return;
        }

        for kind in SensorKind::ALL {
            if !self
                .hub
                .register(kind, self.config.sensor_delay, self.sensor_callbacks.clone())
            {
                warn!(?kind, "Sensor unavailable");
            }
        }

        self.seed_last_known_location();

        if let Some(provider) = &self.provider {
            self.locations.request_updates(
                provider,
                self.config.location_request,
                self.location_callbacks.clone(),
            );
        }

        if !GeomagneticField::is_valid_at(Utc::now()) {
            warn!("Date is outside the geomagnetic model's validity window; declination is extrapolated");
        }

        *tracking = true;
        info!(provider = ?self.provider, "Sensor tracking started");
    }

    fn stop(&self) {
        let mut tracking = self.tracking.lock();
        if !*tracking {
            return;
        }

        self.hub.unregister(&self.sensor_callbacks);
        self.locations.remove_updates(&self.location_callbacks);

        *tracking = false;
        info!("Sensor tracking stopped");
    }
}
