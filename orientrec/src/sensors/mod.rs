//! Live sensor input and the sensor-backed orientation source.
//!
//! The platform's sensor registry and location service are abstracted behind
//! [`SensorHub`] and [`LocationProvider`]. [`SensorOrientationSource`] turns
//! their callbacks into orientation, location and accuracy events:
//!
//! - **Rotation vector** → heading (true north, corrected) and pitch
//! - **Gravity** → roll
//! - **Magnetometer accuracy** → interference flag
//! - **Location fix** → cached location and a fresh declination
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use orientrec::orientation::{OrientationReader, OrientationSource};
//! use orientrec::sensors::{MockSensorHub, SensorOrientationSource, SensorSourceConfig};
//!
//! let hub = Arc::new(MockSensorHub::new());
//! let source = SensorOrientationSource::new(hub.clone(), hub.clone(), SensorSourceConfig::default());
//! source.start();
//! hub.emit_heading(96.0);
//! assert!((source.heading() - 90.0).abs() < 0.1);
//! source.stop();
//! ```

pub mod fusion;
mod input;
mod mock;
mod source;

pub use input::{
    LocationListener, LocationProvider, LocationRequest, SensorAccuracy, SensorDelay, SensorHub,
    SensorKind, SensorListener, SensorReading,
};
pub use mock::MockSensorHub;
pub use source::{SensorOrientationSource, SensorSourceConfig, DEFAULT_MAX_LOCATION_AGE};
