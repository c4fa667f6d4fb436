//! Display units for ground speed.

use std::fmt;
use std::str::FromStr;

/// Unit used to present a location's ground speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    /// Kilometres per hour.
    #[default]
    KilometresPerHour,
    /// Statute miles per hour.
    MilesPerHour,
    /// Nautical miles per hour.
    Knots,
    /// Metres per second (the unit fixes are reported in).
    MetresPerSecond,
}

impl SpeedUnit {
    /// All units, in menu order.
    pub const ALL: [SpeedUnit; 4] = [
        SpeedUnit::KilometresPerHour,
        SpeedUnit::MilesPerHour,
        SpeedUnit::Knots,
        SpeedUnit::MetresPerSecond,
    ];

    /// Convert a speed in metres per second to this unit.
    pub fn convert_mps(&self, mps: f32) -> f32 {
        match self {
            SpeedUnit::KilometresPerHour => mps * 3.6,
            SpeedUnit::MilesPerHour => mps * 2.236_936,
            SpeedUnit::Knots => mps * 1.943_844,
            SpeedUnit::MetresPerSecond => mps,
        }
    }

    /// Short label shown next to a value.
    pub fn label(&self) -> &'static str {
        match self {
            SpeedUnit::KilometresPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::Knots => "kt",
            SpeedUnit::MetresPerSecond => "m/s",
        }
    }

    /// Key used in the configuration file.
    pub fn config_key(&self) -> &'static str {
        match self {
            SpeedUnit::KilometresPerHour => "kmh",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::Knots => "kt",
            SpeedUnit::MetresPerSecond => "mps",
        }
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kmh" | "km/h" => Ok(SpeedUnit::KilometresPerHour),
            "mph" => Ok(SpeedUnit::MilesPerHour),
            "kt" | "kn" | "knots" => Ok(SpeedUnit::Knots),
            "mps" | "m/s" => Ok(SpeedUnit::MetresPerSecond),
            other => Err(format!("unknown speed unit '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!((SpeedUnit::KilometresPerHour.convert_mps(10.0) - 36.0).abs() < 1e-4);
        assert!((SpeedUnit::MilesPerHour.convert_mps(10.0) - 22.369).abs() < 1e-2);
        assert!((SpeedUnit::Knots.convert_mps(10.0) - 19.438).abs() < 1e-2);
        assert_eq!(SpeedUnit::MetresPerSecond.convert_mps(10.0), 10.0);
    }

    #[test]
    fn test_config_key_roundtrip() {
        for unit in SpeedUnit::ALL {
            assert_eq!(unit.config_key().parse::<SpeedUnit>(), Ok(unit));
        }
    }

    #[test]
    fn test_parse_unknown_unit() {
        assert!("furlongs".parse::<SpeedUnit>().is_err());
    }
}
