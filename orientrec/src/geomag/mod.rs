//! Geomagnetic correction: magnetic heading to true heading.
//!
//! The compass reports headings relative to magnetic north. Converting to
//! true north needs the local declination, which this module derives from the
//! World Magnetic Model for a location and time, and a fixed mechanical
//! offset compensating for how the sensor board is mounted.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use orientrec::geomag::{GeomagneticField, HeadingCorrection};
//!
//! let field = GeomagneticField::new(47.5, 19.04, 120.0, Utc::now());
//! let correction = HeadingCorrection::default().with_declination(field.declination());
//! let heading = correction.true_heading(359.0);
//! assert!((0.0..360.0).contains(&heading));
//! ```

mod correction;
mod wmm;

pub use correction::{normalize_heading, HeadingCorrection, DEFAULT_MECHANICAL_OFFSET_DEG};
pub use wmm::GeomagneticField;
