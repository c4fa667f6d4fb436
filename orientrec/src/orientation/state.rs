//! Core orientation state types.

use std::fmt;

use chrono::{DateTime, Utc};

/// Which aspect of a source's state changed.
///
/// Exactly one kind is emitted per physical update. Receivers re-query the
/// source for the current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Heading, pitch or roll changed.
    Orientation,
    /// A new location fix was applied.
    Location,
    /// The magnetic interference flag changed.
    Accuracy,
}

impl ChangeKind {
    /// Single-letter tag used by the event log.
    pub fn tag(&self) -> char {
        match self {
            ChangeKind::Orientation => 'O',
            ChangeKind::Location => 'L',
            ChangeKind::Accuracy => 'A',
        }
    }

    /// Human-readable name for logging/UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Orientation => "orientation",
            ChangeKind::Location => "location",
            ChangeKind::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above the WGS-84 ellipsoid in metres.
    pub altitude: f64,
    /// Direction of travel in degrees.
    pub bearing: f32,
    /// Ground speed in metres per second.
    pub speed: f32,
    /// Estimated horizontal accuracy in metres.
    pub accuracy: f32,
    /// When the fix was taken. Replayed fixes carry no time.
    pub time: Option<DateTime<Utc>>,
}

impl Location {
    /// Create a fix at the given position with zeroed motion fields and no time.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            bearing: 0.0,
            speed: 0.0,
            accuracy: 0.0,
            time: None,
        }
    }

    /// Set bearing, speed and accuracy.
    pub fn with_motion(mut self, bearing: f32, speed: f32, accuracy: f32) -> Self {
        self.bearing = bearing;
        self.speed = speed;
        self.accuracy = accuracy;
        self
    }

    /// Set the fix time.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }
}

/// Composite state of a source at one instant.
///
/// Each field is mutated and notified independently. Values are zero before
/// the first relevant event and `location` stays `None` until the first fix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    /// Heading relative to true north, degrees in `[0, 360)`.
    pub heading: f32,
    /// Forward/backward tilt, degrees in `[-90, 90]`.
    pub pitch: f32,
    /// Side-to-side tilt in degrees.
    pub roll: f32,
    /// Whether the magnetometer accuracy is below "high".
    pub has_interference: bool,
    /// Most recent location fix.
    pub location: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_tags() {
        assert_eq!(ChangeKind::Orientation.tag(), 'O');
        assert_eq!(ChangeKind::Location.tag(), 'L');
        assert_eq!(ChangeKind::Accuracy.tag(), 'A');
    }

    #[test]
    fn test_default_sample_is_zeroed() {
        let sample = OrientationSample::default();
        assert_eq!(sample.heading, 0.0);
        assert_eq!(sample.pitch, 0.0);
        assert_eq!(sample.roll, 0.0);
        assert!(!sample.has_interference);
        assert!(sample.location.is_none());
    }

    #[test]
    fn test_location_builder() {
        let loc = Location::new(47.5, 19.04, 120.0).with_motion(90.0, 1.5, 4.0);
        assert_eq!(loc.bearing, 90.0);
        assert_eq!(loc.speed, 1.5);
        assert_eq!(loc.accuracy, 4.0);
        assert!(loc.time.is_none());
    }
}
