//! Orientation source traits.

use super::listener::SharedListener;
use super::state::{Location, OrientationSample};

/// Read-only view of a source's current state.
///
/// This is what listeners are handed on every notification. All methods are
/// pure readers; values are zero (or `None`) before the first relevant event.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: replay sources notify listeners
/// from their own worker thread.
pub trait OrientationReader: Send + Sync {
    /// Heading relative to true north, degrees in `[0, 360)`.
    fn heading(&self) -> f32;

    /// Pitch in degrees, `[-90, 90]`.
    fn pitch(&self) -> f32;

    /// Roll in degrees.
    fn roll(&self) -> f32;

    /// Whether the compass is currently unreliable due to magnetic interference.
    fn has_interference(&self) -> bool;

    /// The most recent location fix, if any.
    fn location(&self) -> Option<Location>;

    /// Whether at least one location fix has been applied.
    fn has_location(&self) -> bool {
        self.location().is_some()
    }

    /// Whether this source is writing its events to a log.
    fn is_recording(&self) -> bool {
        false
    }

    /// Whether this source is reproducing a log.
    fn is_replaying(&self) -> bool {
        false
    }

    /// Copy of all current values.
    fn snapshot(&self) -> OrientationSample {
        OrientationSample {
            heading: self.heading(),
            pitch: self.pitch(),
            roll: self.roll(),
            has_interference: self.has_interference(),
            location: self.location(),
        }
    }
}

/// A producer of orientation, location and accuracy events.
///
/// Implemented by the live sensor source, the recording decorator and the
/// replay source. `start` and `stop` are idempotent, and `stop` before any
/// `start` is a no-op.
pub trait OrientationSource: OrientationReader {
    /// Register a listener. Adding the same listener twice has no effect.
    fn add_listener(&self, listener: SharedListener);

    /// Unregister a listener. It receives no further notifications.
    fn remove_listener(&self, listener: &SharedListener);

    /// Begin producing events.
    fn start(&self);

    /// Stop producing events and release owned resources.
    fn stop(&self);
}

/// A sample is a frozen reader of its own values.
impl OrientationReader for OrientationSample {
    fn heading(&self) -> f32 {
        self.heading
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn roll(&self) -> f32 {
        self.roll
    }

    fn has_interference(&self) -> bool {
        self.has_interference
    }

    fn location(&self) -> Option<Location> {
        self.location
    }

    fn snapshot(&self) -> OrientationSample {
        *self
    }
}
