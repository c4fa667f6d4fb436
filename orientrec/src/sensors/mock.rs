//! In-memory sensor and location input.
//!
//! [`MockSensorHub`] implements both [`SensorHub`] and [`LocationProvider`].
//! It records every registration and dispatches readings pushed by the caller
//! synchronously, on the caller's thread. Used by the tests and by the CLI's
//! simulated session.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::fusion::rotation_vector_for;
use super::input::{
    LocationListener, LocationProvider, LocationRequest, SensorAccuracy, SensorDelay, SensorHub,
    SensorKind, SensorListener, SensorReading,
};
use crate::orientation::{same_handle, Location};

struct SensorRegistration {
    kind: SensorKind,
    delay: SensorDelay,
    listener: Arc<dyn SensorListener>,
}

struct LocationRegistration {
    provider: String,
    request: LocationRequest,
    listener: Arc<dyn LocationListener>,
}

#[derive(Default)]
struct HubState {
    sensors: Vec<SensorRegistration>,
    locations: Vec<LocationRegistration>,
    unavailable: HashSet<SensorKind>,
    last_known: Option<Location>,
}

/// Scriptable sensor hub and location provider.
pub struct MockSensorHub {
    provider: Option<String>,
    state: Mutex<HubState>,
}

impl Default for MockSensorHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockSensorHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockSensorHub")
            .field("provider", &self.provider)
            .field("sensor_registrations", &state.sensors.len())
            .field("location_registrations", &state.locations.len())
            .finish()
    }
}

impl MockSensorHub {
    /// Name of the provider reported by [`LocationProvider::best_provider`].
    pub const PROVIDER: &'static str = "mock";

    /// A hub with every sensor available and a location provider.
    pub fn new() -> Self {
        Self {
            provider: Some(Self::PROVIDER.to_string()),
            state: Mutex::new(HubState::default()),
        }
    }

    /// A hub with no location provider.
    pub fn without_location_provider() -> Self {
        Self {
            provider: None,
            state: Mutex::new(HubState::default()),
        }
    }

    /// Set the fix returned by [`LocationProvider::last_known_location`].
    pub fn set_last_known_location(&self, location: Option<Location>) {
        self.state.lock().last_known = location;
    }

    /// Make a sensor kind unavailable; later registrations for it fail.
    pub fn set_unavailable(&self, kind: SensorKind) {
        self.state.lock().unavailable.insert(kind);
    }

    /// Number of active sensor registrations.
    pub fn registration_count(&self) -> usize {
        self.state.lock().sensors.len()
    }

    /// Kinds with at least one active registration, with their delay.
    pub fn registered_kinds(&self) -> Vec<(SensorKind, SensorDelay)> {
        self.state
            .lock()
            .sensors
            .iter()
            .map(|r| (r.kind, r.delay))
            .collect()
    }

    /// Number of active location update requests.
    pub fn location_request_count(&self) -> usize {
        self.state.lock().locations.len()
    }

    /// Provider and thresholds of the active location requests.
    pub fn location_requests(&self) -> Vec<(String, LocationRequest)> {
        self.state
            .lock()
            .locations
            .iter()
            .map(|r| (r.provider.clone(), r.request))
            .collect()
    }

    /// Dispatch a reading to every listener registered for its kind.
    pub fn emit(&self, reading: SensorReading) {
        for listener in self.sensor_listeners(reading.kind()) {
            listener.on_sensor_changed(&reading);
        }
    }

    /// Dispatch an accuracy change to every listener registered for the kind.
    pub fn emit_accuracy(&self, kind: SensorKind, accuracy: SensorAccuracy) {
        for listener in self.sensor_listeners(kind) {
            listener.on_accuracy_changed(kind, accuracy);
        }
    }

    /// Dispatch a fix to every location listener.
    pub fn emit_location(&self, location: Location) {
        let listeners: Vec<_> = self
            .state
            .lock()
            .locations
            .iter()
            .map(|r| r.listener.clone())
            .collect();
        for listener in listeners {
            listener.on_location_changed(location);
        }
    }

    /// Emit the rotation vector of an upright device facing `azimuth_deg`
    /// relative to magnetic north, tilted by `pitch_deg`.
    pub fn emit_attitude(&self, azimuth_deg: f32, pitch_deg: f32) {
        let (x, y, z, w) = rotation_vector_for(azimuth_deg, pitch_deg);
        self.emit(SensorReading::RotationVector { x, y, z, w: Some(w) });
    }

    /// Emit the rotation vector of a level, upright device facing `azimuth_deg`.
    pub fn emit_heading(&self, azimuth_deg: f32) {
        self.emit_attitude(azimuth_deg, 0.0);
    }

    /// Emit a gravity sample.
    pub fn emit_gravity(&self, x: f32, y: f32, z: f32) {
        self.emit(SensorReading::Gravity { x, y, z });
    }

    fn sensor_listeners(&self, kind: SensorKind) -> Vec<Arc<dyn SensorListener>> {
        self.state
            .lock()
            .sensors
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.listener.clone())
            .collect()
    }
}

impl SensorHub for MockSensorHub {
    fn register(
        &self,
        kind: SensorKind,
        delay: SensorDelay,
        listener: Arc<dyn SensorListener>,
    ) -> bool {
        let mut state = self.state.lock();
        if state.unavailable.contains(&kind) {
            return false;
        }
        let exists = state
            .sensors
            .iter()
            .any(|r| r.kind == kind && same_handle(&r.listener, &listener));
        if !exists {
            state.sensors.push(SensorRegistration {
                kind,
                delay,
                listener,
            });
        }
        true
    }

    fn unregister(&self, listener: &Arc<dyn SensorListener>) {
        self.state
            .lock()
            .sensors
            .retain(|r| !same_handle(&r.listener, listener));
    }
}

impl LocationProvider for MockSensorHub {
    fn best_provider(&self) -> Option<String> {
        self.provider.clone()
    }

    fn request_updates(
        &self,
        provider: &str,
        request: LocationRequest,
        listener: Arc<dyn LocationListener>,
    ) {
        let mut state = self.state.lock();
        // A repeated request replaces the previous one for the same listener.
        state
            .locations
            .retain(|r| !same_handle(&r.listener, &listener));
        state.locations.push(LocationRegistration {
            provider: provider.to_string(),
            request,
            listener,
        });
    }

    fn remove_updates(&self, listener: &Arc<dyn LocationListener>) {
        self.state
            .lock()
            .locations
            .retain(|r| !same_handle(&r.listener, listener));
    }

    fn last_known_location(&self) -> Option<Location> {
        self.state.lock().last_known
    }
}
