//! World Magnetic Model evaluation.
//!
//! Evaluates the degree/order 12 spherical-harmonic main field (epoch 2020.0,
//! with linear secular variation) at a geodetic position and returns the
//! field in the local north/east/down frame.
//!
//! The 2020 coefficients are specified for 2020.0 through 2024.12.31. Later
//! dates are extrapolated along the secular variation, which drifts by
//! roughly a tenth of a degree of declination per year past the window;
//! [`GeomagneticField::is_valid_at`] reports whether a time is inside it.
//!
//! # Design
//!
//! - Geodetic coordinates are converted to geocentric (WGS-84) first
//! - Associated Legendre functions are computed Gauss-normalised by recursion
//!   and rescaled to Schmidt quasi-normalisation
//! - The geocentric field is rotated back into the geodetic frame

use std::f64::consts::FRAC_PI_2;

use chrono::{DateTime, Utc};

/// Number of degrees in the model, including degree 0.
const MAX_N: usize = 13;

/// WGS-84 semi-major axis.
const EARTH_SEMI_MAJOR_AXIS_KM: f64 = 6378.137;

/// WGS-84 semi-minor axis.
const EARTH_SEMI_MINOR_AXIS_KM: f64 = 6356.752_314_2;

/// Geomagnetic reference radius.
const EARTH_REFERENCE_RADIUS_KM: f64 = 6371.2;

/// The model is singular at the poles; latitudes are kept this far inside them.
const POLE_EPSILON_DEG: f64 = 1e-5;

/// Model epoch (2020-01-01T00:00:00Z) in milliseconds since the Unix epoch.
const MODEL_EPOCH_MS: i64 = 1_577_836_800_000;

/// End of the model's validity window (2025-01-01T00:00:00Z), exclusive.
const MODEL_VALID_UNTIL_MS: i64 = 1_735_689_600_000;

const MILLIS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Model coefficients: (n, m, g, h, dg/dt, dh/dt), nT and nT/year.
#[rustfmt::skip]
const WMM_COEFFICIENTS: [(u8, u8, f64, f64, f64, f64); 90] = [
    (1, 0, -29404.5, 0.0, 6.7, 0.0),
    (1, 1, -1450.7, 4652.9, 7.7, -25.1),
    (2, 0, -2500.0, 0.0, -11.5, 0.0),
    (2, 1, 2982.0, -2991.6, -7.1, -30.2),
    (2, 2, 1676.8, -734.8, -2.2, -23.9),
    (3, 0, 1363.9, 0.0, 2.8, 0.0),
    (3, 1, -2381.0, -82.2, -6.2, 5.7),
    (3, 2, 1236.2, 241.8, 3.4, -1.0),
    (3, 3, 525.7, -542.9, -12.2, 1.1),
    (4, 0, 903.1, 0.0, -1.1, 0.0),
    (4, 1, 809.4, 282.0, -1.6, 0.2),
    (4, 2, 86.2, -158.4, -6.0, 6.9),
    (4, 3, -309.4, 199.8, 5.4, 3.7),
    (4, 4, 47.9, -350.1, -5.5, -5.6),
    (5, 0, -234.4, 0.0, -0.3, 0.0),
    (5, 1, 363.1, 47.7, 0.6, 0.1),
    (5, 2, 187.8, 208.4, -0.7, 2.5),
    (5, 3, -140.7, -121.3, 0.1, -0.9),
    (5, 4, -151.2, 32.2, 1.2, 3.0),
    (5, 5, 13.7, 99.1, 1.0, 0.5),
    (6, 0, 65.9, 0.0, -0.6, 0.0),
    (6, 1, 65.6, -19.1, -0.4, 0.1),
    (6, 2, 73.0, 25.0, 0.5, -1.8),
    (6, 3, -121.5, 52.7, 1.4, -1.4),
    (6, 4, -36.2, -64.4, -1.4, 0.9),
    (6, 5, 13.5, 9.0, -0.0, 0.1),
    (6, 6, -64.7, 68.1, 0.8, 1.0),
    (7, 0, 80.6, 0.0, -0.1, 0.0),
    (7, 1, -76.8, -51.4, -0.3, 0.5),
    (7, 2, -8.3, -16.8, -0.1, 0.6),
    (7, 3, 56.5, 2.3, 0.7, -0.7),
    (7, 4, 15.8, 23.5, 0.2, -0.2),
    (7, 5, 6.4, -2.2, -0.5, -1.2),
    (7, 6, -7.2, -27.2, -0.8, 0.2),
    (7, 7, 9.8, -1.9, 1.0, 0.3),
    (8, 0, 23.6, 0.0, -0.1, 0.0),
    (8, 1, 9.8, 8.4, 0.1, -0.3),
    (8, 2, -17.5, -15.3, -0.1, 0.7),
    (8, 3, -0.4, 12.8, 0.5, -0.2),
    (8, 4, -21.1, -11.8, -0.1, 0.5),
    (8, 5, 15.3, 14.9, 0.4, -0.3),
    (8, 6, 13.7, 3.6, 0.5, -0.5),
    (8, 7, -16.5, -6.9, 0.0, 0.4),
    (8, 8, -0.3, 2.8, 0.4, 0.1),
    (9, 0, 5.0, 0.0, -0.1, 0.0),
    (9, 1, 8.2, -23.3, -0.2, -0.3),
    (9, 2, 2.9, 11.1, -0.0, 0.2),
    (9, 3, -1.4, 9.8, 0.4, -0.4),
    (9, 4, -1.1, -5.1, -0.3, 0.4),
    (9, 5, -13.3, -6.2, -0.0, 0.1),
    (9, 6, 1.1, 7.8, 0.3, -0.0),
    (9, 7, 8.9, 0.4, -0.0, -0.2),
    (9, 8, -9.3, -1.5, -0.0, 0.5),
    (9, 9, -11.9, 9.7, -0.4, 0.2),
    (10, 0, -1.9, 0.0, 0.0, 0.0),
    (10, 1, -6.2, 3.4, -0.0, -0.0),
    (10, 2, -0.1, -0.2, -0.0, 0.1),
    (10, 3, 1.7, 3.5, 0.2, -0.3),
    (10, 4, -0.9, 4.8, -0.1, 0.1),
    (10, 5, 0.6, -8.6, -0.2, -0.2),
    (10, 6, -0.9, -0.1, -0.0, 0.1),
    (10, 7, 1.9, -4.2, -0.1, -0.0),
    (10, 8, 1.4, -3.4, -0.2, -0.1),
    (10, 9, -2.4, -0.1, -0.1, 0.2),
    (10, 10, -3.9, -8.8, -0.0, -0.0),
    (11, 0, 3.0, 0.0, -0.0, 0.0),
    (11, 1, -1.4, -0.0, -0.1, -0.0),
    (11, 2, -2.5, 2.6, -0.0, 0.1),
    (11, 3, 2.4, -0.5, 0.0, 0.0),
    (11, 4, -0.9, -0.4, -0.0, 0.2),
    (11, 5, 0.3, 0.6, -0.1, -0.0),
    (11, 6, -0.7, -0.2, 0.0, 0.0),
    (11, 7, -0.1, -1.7, -0.0, 0.1),
    (11, 8, 1.4, -1.6, -0.1, -0.0),
    (11, 9, -0.6, -3.0, -0.1, -0.1),
    (11, 10, 0.2, -2.0, -0.1, 0.0),
    (11, 11, 3.1, -2.6, -0.1, -0.0),
    (12, 0, -2.0, 0.0, 0.0, 0.0),
    (12, 1, -0.1, -1.2, -0.0, -0.0),
    (12, 2, 0.5, 0.5, -0.0, 0.0),
    (12, 3, 1.3, 1.3, 0.0, -0.1),
    (12, 4, -1.2, -1.8, -0.0, 0.1),
    (12, 5, 0.7, 0.1, -0.0, -0.0),
    (12, 6, 0.3, 0.7, 0.0, 0.0),
    (12, 7, 0.5, -0.1, -0.0, -0.0),
    (12, 8, -0.2, 0.6, 0.0, 0.1),
    (12, 9, -0.5, 0.2, -0.0, -0.0),
    (12, 10, 0.1, -0.9, -0.0, -0.0),
    (12, 11, -1.1, -0.0, -0.0, 0.0),
    (12, 12, -0.3, 0.5, -0.1, -0.1),
];

/// Estimated geomagnetic field at a point on (or above) the Earth.
///
/// Components are in nanotesla in the local geodetic frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeomagneticField {
    /// Northward component.
    north: f64,
    /// Eastward component.
    east: f64,
    /// Downward component.
    down: f64,
}

impl GeomagneticField {
    /// Evaluate the model.
    ///
    /// # Arguments
    ///
    /// * `latitude_deg` - Geodetic latitude in degrees
    /// * `longitude_deg` - Longitude in degrees
    /// * `altitude_m` - Altitude above the WGS-84 ellipsoid in metres
    /// * `time` - When the field is wanted (secular variation is linear)
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64, time: DateTime<Utc>) -> Self {
        let gd_latitude_deg =
            latitude_deg.clamp(-90.0 + POLE_EPSILON_DEG, 90.0 - POLE_EPSILON_DEG);
        let gc = Geocentric::from_geodetic(gd_latitude_deg, longitude_deg, altitude_m);

        // Legendre functions of cos(theta) where theta is the colatitude.
        let legendre = LegendreTable::new(FRAC_PI_2 - gc.latitude_rad);
        let schmidt = schmidt_quasi_norm_factors();

        // (reference radius / radius)^i
        let mut relative_radius_power = [0.0; MAX_N + 2];
        relative_radius_power[0] = 1.0;
        relative_radius_power[1] = EARTH_REFERENCE_RADIUS_KM / gc.radius_km;
        for i in 2..relative_radius_power.len() {
            relative_radius_power[i] = relative_radius_power[i - 1] * relative_radius_power[1];
        }

        let inverse_cos_latitude = 1.0 / gc.latitude_rad.cos();
        let years = years_since_epoch(time);

        let mut gc_x = 0.0; // north
        let mut gc_y = 0.0; // east
        let mut gc_z = 0.0; // down

        for &(n, m, g0, h0, dg, dh) in WMM_COEFFICIENTS.iter() {
            let n = n as usize;
            let m = m as usize;
            let g = g0 + years * dg;
            let h = h0 + years * dh;
            let (sin_m_lon, cos_m_lon) = (m as f64 * gc.longitude_rad).sin_cos();
            let radius_term = relative_radius_power[n + 2];
            let norm = schmidt[n][m];

            gc_x += radius_term
                * (g * cos_m_lon + h * sin_m_lon)
                * legendre.p_deriv[n][m]
                * norm;

            gc_y += radius_term
                * m as f64
                * (g * sin_m_lon - h * cos_m_lon)
                * legendre.p[n][m]
                * norm
                * inverse_cos_latitude;

            gc_z -= (n as f64 + 1.0)
                * radius_term
                * (g * cos_m_lon + h * sin_m_lon)
                * legendre.p[n][m]
                * norm;
        }

        // Rotate from the geocentric into the geodetic frame.
        let lat_diff_rad = gd_latitude_deg.to_radians() - gc.latitude_rad;
        let (sin_diff, cos_diff) = lat_diff_rad.sin_cos();

        Self {
            north: gc_x * cos_diff + gc_z * sin_diff,
            east: gc_y,
            down: -gc_x * sin_diff + gc_z * cos_diff,
        }
    }

    /// Whether `time` falls inside the model's five-year validity window.
    pub fn is_valid_at(time: DateTime<Utc>) -> bool {
        (MODEL_EPOCH_MS..MODEL_VALID_UNTIL_MS).contains(&time.timestamp_millis())
    }

    /// Northward component in nT.
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Eastward component in nT.
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Downward component in nT.
    pub fn down(&self) -> f64 {
        self.down
    }

    /// Declination in degrees: angle of the horizontal field east of true north.
    pub fn declination(&self) -> f32 {
        self.east.atan2(self.north).to_degrees() as f32
    }

    /// Inclination in degrees: angle below horizontal (negative points up).
    pub fn inclination(&self) -> f32 {
        self.down.atan2(self.horizontal_strength()).to_degrees() as f32
    }

    /// Horizontal field strength in nT.
    pub fn horizontal_strength(&self) -> f64 {
        self.north.hypot(self.east)
    }

    /// Total field strength in nT.
    pub fn field_strength(&self) -> f64 {
        (self.north * self.north + self.east * self.east + self.down * self.down).sqrt()
    }
}

/// Decimal years between the model epoch and `time`.
fn years_since_epoch(time: DateTime<Utc>) -> f64 {
    (time.timestamp_millis() - MODEL_EPOCH_MS) as f64 / MILLIS_PER_YEAR
}

/// Geocentric spherical coordinates.
#[derive(Debug, Clone, Copy)]
struct Geocentric {
    latitude_rad: f64,
    longitude_rad: f64,
    radius_km: f64,
}

impl Geocentric {
    fn from_geodetic(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        let altitude_km = altitude_m / 1000.0;
        let a2 = EARTH_SEMI_MAJOR_AXIS_KM * EARTH_SEMI_MAJOR_AXIS_KM;
        let b2 = EARTH_SEMI_MINOR_AXIS_KM * EARTH_SEMI_MINOR_AXIS_KM;
        let (slat, clat) = latitude_deg.to_radians().sin_cos();
        let tlat = slat / clat;
        let denom = a2 * clat * clat + b2 * slat * slat;
        let lat_rad = denom.sqrt();

        let latitude_rad =
            (tlat * (lat_rad * altitude_km + b2) / (lat_rad * altitude_km + a2)).atan();

        let radius_sq = altitude_km * altitude_km
            + 2.0 * altitude_km * lat_rad
            + (a2 * a2 * clat * clat + b2 * b2 * slat * slat) / denom;

        Self {
            latitude_rad,
            longitude_rad: longitude_deg.to_radians(),
            radius_km: radius_sq.sqrt(),
        }
    }
}

/// Gauss-normalised associated Legendre functions and their theta derivatives.
struct LegendreTable {
    p: [[f64; MAX_N]; MAX_N],
    p_deriv: [[f64; MAX_N]; MAX_N],
}

impl LegendreTable {
    fn new(theta_rad: f64) -> Self {
        let (sin, cos) = theta_rad.sin_cos();
        let mut p = [[0.0; MAX_N]; MAX_N];
        let mut p_deriv = [[0.0; MAX_N]; MAX_N];
        p[0][0] = 1.0;

        for n in 1..MAX_N {
            for m in 0..=n {
                if n == m {
                    p[n][m] = sin * p[n - 1][m - 1];
                    p_deriv[n][m] = cos * p[n - 1][m - 1] + sin * p_deriv[n - 1][m - 1];
                } else if n == 1 || m == n - 1 {
                    p[n][m] = cos * p[n - 1][m];
                    p_deriv[n][m] = -sin * p[n - 1][m] + cos * p_deriv[n - 1][m];
                } else {
                    let k = ((n - 1) * (n - 1) - m * m) as f64
                        / ((2 * n - 1) * (2 * n - 3)) as f64;
                    p[n][m] = cos * p[n - 1][m] - k * p[n - 2][m];
                    p_deriv[n][m] =
                        -sin * p[n - 1][m] + cos * p_deriv[n - 1][m] - k * p_deriv[n - 2][m];
                }
            }
        }

        Self { p, p_deriv }
    }
}

/// Factors converting Gauss normalisation to Schmidt quasi-normalisation.
fn schmidt_quasi_norm_factors() -> [[f64; MAX_N]; MAX_N] {
    let mut factors = [[0.0; MAX_N]; MAX_N];
    factors[0][0] = 1.0;
    for n in 1..MAX_N {
        factors[n][0] = factors[n - 1][0] * (2 * n - 1) as f64 / n as f64;
        for m in 1..=n {
            let doubling = if m == 1 { 2 } else { 1 };
            factors[n][m] =
                factors[n][m - 1] * (((n - m + 1) * doubling) as f64 / (n + m) as f64).sqrt();
        }
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch_2020() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_model_epoch_constant() {
        assert_eq!(epoch_2020().timestamp_millis(), MODEL_EPOCH_MS);
        assert_eq!(years_since_epoch(epoch_2020()), 0.0);
    }

    #[test]
    fn test_validity_window() {
        let at = |ms: i64| Utc.timestamp_millis_opt(ms).unwrap();
        assert!(GeomagneticField::is_valid_at(at(MODEL_EPOCH_MS)));
        assert!(GeomagneticField::is_valid_at(at(MODEL_VALID_UNTIL_MS - 1)));
        assert!(!GeomagneticField::is_valid_at(at(MODEL_VALID_UNTIL_MS)));
        assert!(!GeomagneticField::is_valid_at(at(MODEL_EPOCH_MS - 1)));
    }

    #[test]
    fn test_declination_boulder() {
        // NOAA reference for 2020: ~8.2° east
        let field = GeomagneticField::new(40.015, -105.27, 1655.0, epoch_2020());
        let decl = field.declination();
        assert!((7.0..9.5).contains(&decl), "Boulder declination {}", decl);
    }

    #[test]
    fn test_declination_seattle() {
        // ~15.3° east in 2020
        let field = GeomagneticField::new(47.61, -122.33, 50.0, epoch_2020());
        let decl = field.declination();
        assert!((14.0..16.5).contains(&decl), "Seattle declination {}", decl);
    }

    #[test]
    fn test_declination_sign_east_coast() {
        // The US east coast has westerly (negative) declination.
        let field = GeomagneticField::new(42.36, -71.06, 0.0, epoch_2020());
        let decl = field.declination();
        assert!((-16.0..-12.0).contains(&decl), "Boston declination {}", decl);
    }

    #[test]
    fn test_field_points_north_at_equator() {
        let field = GeomagneticField::new(0.0, 0.0, 0.0, epoch_2020());
        assert!(field.north() > 20_000.0, "north {}", field.north());
    }

    #[test]
    fn test_inclination_sign_by_hemisphere() {
        let north = GeomagneticField::new(52.0, 0.0, 0.0, epoch_2020());
        let south = GeomagneticField::new(-34.0, 151.0, 0.0, epoch_2020());
        assert!(north.inclination() > 45.0);
        assert!(south.inclination() < -45.0);
    }

    #[test]
    fn test_field_strength_plausible() {
        for &(lat, lon) in &[(0.0, 0.0), (45.0, 90.0), (-60.0, -45.0), (70.0, -150.0)] {
            let field = GeomagneticField::new(lat, lon, 0.0, epoch_2020());
            let total = field.field_strength();
            assert!(
                (20_000.0..70_000.0).contains(&total),
                "field strength at ({}, {}) = {}",
                lat,
                lon,
                total
            );
        }
    }

    #[test]
    fn test_poles_are_finite() {
        for lat in [90.0, -90.0] {
            let field = GeomagneticField::new(lat, 0.0, 0.0, epoch_2020());
            assert!(field.declination().is_finite());
            assert!(field.field_strength().is_finite());
        }
    }

    #[test]
    fn test_secular_variation_is_small() {
        let then = GeomagneticField::new(47.5, 19.04, 0.0, epoch_2020());
        let later = GeomagneticField::new(
            47.5,
            19.04,
            0.0,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        let drift = (later.declination() - then.declination()).abs();
        assert!(drift > 0.0 && drift < 2.0, "drift {}", drift);
    }

    #[test]
    fn test_schmidt_factors_low_degree() {
        let factors = schmidt_quasi_norm_factors();
        assert_eq!(factors[1][0], 1.0);
        assert!((factors[1][1] - 1.0).abs() < 1e-12);
        assert!((factors[2][0] - 1.5).abs() < 1e-12);
    }
}
