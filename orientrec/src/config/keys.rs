//! Typed access to individual configuration settings by `section.key` name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{expand_tilde, ConfigError, ConfigFile};
use crate::orientation::SpeedUnit;

/// One configurable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    RecordingDirectory,
    RecordingAutoRecord,
    SensorsArmOffsetDegrees,
    SensorsMaxLocationAgeMinutes,
    SensorsLocationIntervalSecs,
    SensorsLocationMinDistanceM,
    DisplaySpeedUnit,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::RecordingDirectory,
            ConfigKey::RecordingAutoRecord,
            ConfigKey::SensorsArmOffsetDegrees,
            ConfigKey::SensorsMaxLocationAgeMinutes,
            ConfigKey::SensorsLocationIntervalSecs,
            ConfigKey::SensorsLocationMinDistanceM,
            ConfigKey::DisplaySpeedUnit,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::RecordingDirectory | ConfigKey::RecordingAutoRecord => "recording",
            ConfigKey::SensorsArmOffsetDegrees
            | ConfigKey::SensorsMaxLocationAgeMinutes
            | ConfigKey::SensorsLocationIntervalSecs
            | ConfigKey::SensorsLocationMinDistanceM => "sensors",
            ConfigKey::DisplaySpeedUnit => "display",
            ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::RecordingDirectory | ConfigKey::LoggingDirectory => "directory",
            ConfigKey::RecordingAutoRecord => "auto_record",
            ConfigKey::SensorsArmOffsetDegrees => "arm_offset_degrees",
            ConfigKey::SensorsMaxLocationAgeMinutes => "max_location_age_minutes",
            ConfigKey::SensorsLocationIntervalSecs => "location_interval_secs",
            ConfigKey::SensorsLocationMinDistanceM => "location_min_distance_m",
            ConfigKey::DisplaySpeedUnit => "speed_unit",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as it would be written to the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::RecordingDirectory => config.recording.directory.display().to_string(),
            ConfigKey::RecordingAutoRecord => config.recording.auto_record.to_string(),
            ConfigKey::SensorsArmOffsetDegrees => config.sensors.arm_offset_degrees.to_string(),
            ConfigKey::SensorsMaxLocationAgeMinutes => {
                config.sensors.max_location_age_minutes.to_string()
            }
            ConfigKey::SensorsLocationIntervalSecs => {
                config.sensors.location_interval_secs.to_string()
            }
            ConfigKey::SensorsLocationMinDistanceM => {
                config.sensors.location_min_distance_m.to_string()
            }
            ConfigKey::DisplaySpeedUnit => config.display.speed_unit.config_key().to_string(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse and store a value. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::RecordingDirectory => {
                config.recording.directory = self.parse_path(value)?;
            }
            ConfigKey::RecordingAutoRecord => {
                config.recording.auto_record = self.parse_bool(value)?;
            }
            ConfigKey::SensorsArmOffsetDegrees => {
                config.sensors.arm_offset_degrees = self.parse_number(value)?;
            }
            ConfigKey::SensorsMaxLocationAgeMinutes => {
                config.sensors.max_location_age_minutes = self.parse_number(value)?;
            }
            ConfigKey::SensorsLocationIntervalSecs => {
                config.sensors.location_interval_secs = self.parse_number(value)?;
            }
            ConfigKey::SensorsLocationMinDistanceM => {
                let distance: f32 = self.parse_number(value)?;
                if distance < 0.0 {
                    return Err(self.invalid(value, "must not be negative"));
                }
                config.sensors.location_min_distance_m = distance;
            }
            ConfigKey::DisplaySpeedUnit => {
                config.display.speed_unit = value
                    .parse::<SpeedUnit>()
                    .map_err(|reason| self.invalid(value, &reason))?;
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(expand_tilde(value))
                };
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_path(&self, value: &str) -> Result<PathBuf, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value, "a path is required"));
        }
        Ok(expand_tilde(value))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_number<T: FromStr>(&self, value: &str) -> Result<T, ConfigError>
    where
        T::Err: fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, &e.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!(
            "recording.auto_record".parse::<ConfigKey>().unwrap(),
            ConfigKey::RecordingAutoRecord
        );
        assert_eq!(
            "Display.Speed_Unit".parse::<ConfigKey>().unwrap(),
            ConfigKey::DisplaySpeedUnit
        );
        assert!(matches!(
            "recording.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_name_is_unique_and_parses() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::SensorsArmOffsetDegrees
            .set(&mut config, "7.5")
            .unwrap();
        assert_eq!(config.sensors.arm_offset_degrees, 7.5);
        assert_eq!(ConfigKey::SensorsArmOffsetDegrees.get(&config), "7.5");

        ConfigKey::DisplaySpeedUnit.set(&mut config, "mph").unwrap();
        assert_eq!(config.display.speed_unit, SpeedUnit::MilesPerHour);
        assert_eq!(ConfigKey::DisplaySpeedUnit.get(&config), "mph");

        ConfigKey::RecordingAutoRecord.set(&mut config, "Yes").unwrap();
        assert!(config.recording.auto_record);
    }

    #[test]
    fn test_logging_directory_can_be_cleared() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingDirectory
            .set(&mut config, "/tmp/diag")
            .unwrap();
        assert_eq!(config.logging.directory, Some(PathBuf::from("/tmp/diag")));

        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert!(config.logging.directory.is_none());
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "");
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ConfigFile::default();
        let cases = [
            (ConfigKey::SensorsMaxLocationAgeMinutes, "-1"),
            (ConfigKey::SensorsArmOffsetDegrees, "six"),
            (ConfigKey::SensorsLocationMinDistanceM, "-3"),
            (ConfigKey::DisplaySpeedUnit, "furlongs"),
            (ConfigKey::RecordingAutoRecord, "maybe"),
            (ConfigKey::RecordingDirectory, ""),
        ];
        for (key, value) in cases {
            let err = key.set(&mut config, value).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { .. }),
                "{} = {:?} gave {:?}",
                key,
                value,
                err
            );
        }
        assert_eq!(config, ConfigFile::default());
    }
}
