//! True-north heading correction.

use super::wmm::GeomagneticField;

/// Default compensation for the sensor board's hinge mounting.
///
/// The hinge can displace the sensors anywhere from 0 to about 12 degrees and
/// the actual angle cannot be measured, so the midpoint is used.
pub const DEFAULT_MECHANICAL_OFFSET_DEG: f32 = 6.0;

/// Normalize a heading into `[0, 360)`.
///
/// Wraps with a Euclidean remainder rather than clamping. A tiny negative
/// input can round up to exactly 360, which folds to 0.
pub fn normalize_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Converts magnetic headings to true headings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingCorrection {
    /// Local declination in degrees (east positive). Zero until a location is known.
    pub declination_deg: f32,
    /// Constant bias subtracted to compensate for the sensor mounting.
    pub mechanical_offset_deg: f32,
}

impl Default for HeadingCorrection {
    fn default() -> Self {
        Self::new(DEFAULT_MECHANICAL_OFFSET_DEG)
    }
}

impl HeadingCorrection {
    /// Create a correction with zero declination.
    pub fn new(mechanical_offset_deg: f32) -> Self {
        Self {
            declination_deg: 0.0,
            mechanical_offset_deg,
        }
    }

    /// Replace the declination.
    pub fn with_declination(mut self, declination_deg: f32) -> Self {
        self.declination_deg = declination_deg;
        self
    }

    /// Replace the declination with the one from an evaluated field.
    pub fn with_field(self, field: &GeomagneticField) -> Self {
        self.with_declination(field.declination())
    }

    /// True heading in `[0, 360)` for a heading relative to magnetic north.
    pub fn true_heading(&self, magnetic_heading_deg: f32) -> f32 {
        normalize_heading(magnetic_heading_deg + self.declination_deg - self.mechanical_offset_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wraps_not_clamps() {
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-10.0), 350.0);
        assert_eq!(normalize_heading(720.0), 0.0);
        assert_eq!(normalize_heading(0.0), 0.0);
    }

    #[test]
    fn test_normalize_tiny_negative() {
        let heading = normalize_heading(-1e-7);
        assert!((0.0..360.0).contains(&heading), "got {}", heading);
    }

    #[test]
    fn test_correction_without_declination() {
        let correction = HeadingCorrection::default();
        assert_eq!(correction.true_heading(90.0), 84.0);
        // Offset pushes small headings below zero; they must wrap.
        assert_eq!(correction.true_heading(2.0), 356.0);
    }

    #[test]
    fn test_correction_with_declination() {
        let correction = HeadingCorrection::new(0.0).with_declination(8.5);
        assert_eq!(correction.true_heading(355.0), 3.5);

        let west = HeadingCorrection::new(0.0).with_declination(-14.0);
        assert_eq!(west.true_heading(10.0), 356.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_normalized_heading_in_range(value in -1.0e6f32..1.0e6f32) {
                let heading = normalize_heading(value);
                prop_assert!((0.0..360.0).contains(&heading), "{} -> {}", value, heading);
            }

            #[test]
            fn test_true_heading_in_range(
                magnetic in -180.0f32..360.0,
                declination in -30.0f32..30.0,
                offset in 0.0f32..12.0,
            ) {
                let correction = HeadingCorrection::new(offset).with_declination(declination);
                let heading = correction.true_heading(magnetic);
                prop_assert!((0.0..360.0).contains(&heading));
            }
        }
    }
}
