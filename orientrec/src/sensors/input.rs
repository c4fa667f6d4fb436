//! Abstract sensor and location input.
//!
//! The host platform implements [`SensorHub`] and [`LocationProvider`]; the
//! core only registers and unregisters callbacks through them. Callbacks are
//! expected to arrive sequentially on one dispatch context.

use std::sync::Arc;
use std::time::Duration;

use crate::orientation::Location;

/// Sensor channels consumed by the live source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Fused attitude as a rotation vector (unit quaternion).
    RotationVector,
    /// Gravity vector in the device frame.
    Gravity,
    /// Raw magnetometer. Used for its accuracy reports only.
    MagneticField,
}

impl SensorKind {
    /// All channels the live source subscribes to.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::RotationVector,
        SensorKind::Gravity,
        SensorKind::MagneticField,
    ];
}

/// One sample from a sensor channel, in the device frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    /// Vector part of the attitude quaternion, with the scalar part if the
    /// hardware reports it.
    RotationVector { x: f32, y: f32, z: f32, w: Option<f32> },
    /// Gravity in m/s².
    Gravity { x: f32, y: f32, z: f32 },
    /// Magnetic field in µT.
    MagneticField { x: f32, y: f32, z: f32 },
}

impl SensorReading {
    /// The channel this reading belongs to.
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::RotationVector { .. } => SensorKind::RotationVector,
            SensorReading::Gravity { .. } => SensorKind::Gravity,
            SensorReading::MagneticField { .. } => SensorKind::MagneticField,
        }
    }
}

/// Reported sensor accuracy, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

/// Requested sampling rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorDelay {
    Fastest,
    Game,
    /// Suitable for driving a user interface.
    #[default]
    Ui,
    Normal,
}

impl SensorDelay {
    /// Nominal interval between samples.
    pub fn interval(&self) -> Duration {
        match self {
            SensorDelay::Fastest => Duration::ZERO,
            SensorDelay::Game => Duration::from_millis(20),
            SensorDelay::Ui => Duration::from_millis(66),
            SensorDelay::Normal => Duration::from_millis(200),
        }
    }
}

/// Receives sensor samples and accuracy changes.
pub trait SensorListener: Send + Sync {
    /// A new sample arrived.
    fn on_sensor_changed(&self, reading: &SensorReading);

    /// The accuracy of a channel changed.
    fn on_accuracy_changed(&self, kind: SensorKind, accuracy: SensorAccuracy);
}

/// Platform sensor registry.
pub trait SensorHub: Send + Sync {
    /// Subscribe a listener to one channel. Returns false if the device has no
    /// such sensor.
    fn register(&self, kind: SensorKind, delay: SensorDelay, listener: Arc<dyn SensorListener>)
        -> bool;

    /// Remove every subscription held by the listener.
    fn unregister(&self, listener: &Arc<dyn SensorListener>);
}

/// Thresholds for periodic location updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    /// Minimum time between fixes.
    pub min_interval: Duration,
    /// Minimum distance between fixes in metres.
    pub min_distance_m: f32,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(3),
            min_distance_m: 1.0,
        }
    }
}

/// Receives location fixes.
pub trait LocationListener: Send + Sync {
    fn on_location_changed(&self, location: Location);
}

/// Platform location service.
pub trait LocationProvider: Send + Sync {
    /// Name of the best available fine-accuracy provider (with altitude,
    /// bearing and speed), if any.
    fn best_provider(&self) -> Option<String>;

    /// Start periodic updates from a provider.
    fn request_updates(
        &self,
        provider: &str,
        request: LocationRequest,
        listener: Arc<dyn LocationListener>,
    );

    /// Stop updates to the listener.
    fn remove_updates(&self, listener: &Arc<dyn LocationListener>);

    /// Best-effort cached fix from any provider.
    fn last_known_location(&self) -> Option<Location>;
}
