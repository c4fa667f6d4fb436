//! The INI configuration file.
//!
//! ```ini
//! [recording]
//! directory = ~/.local/share/orientrec/logs
//! auto_record = false
//!
//! [sensors]
//! arm_offset_degrees = 6.0
//! max_location_age_minutes = 30
//! location_interval_secs = 3
//! location_min_distance_m = 1.0
//!
//! [display]
//! speed_unit = kmh
//!
//! [logging]
//! directory = ~/.local/share/orientrec/diagnostics
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::keys::ConfigKey;
use crate::geomag::DEFAULT_MECHANICAL_OFFSET_DEG;
use crate::orientation::SpeedUnit;
use crate::recording::RecordingConfig;
use crate::sensors::{LocationRequest, SensorSourceConfig};

/// Name of the application directory under the platform config/data dirs.
const APP_DIR: &str = "orientrec";

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value does not parse for its key.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The key is not one of [`ConfigKey::all`].
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default directory for orientation logs.
pub fn default_log_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("logs")
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_tilde(value: &str) -> PathBuf {
    match (value.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(value),
    }
}

/// `[recording]`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSettings {
    pub directory: PathBuf,
    pub auto_record: bool,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            auto_record: false,
        }
    }
}

/// `[sensors]`
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSettings {
    pub arm_offset_degrees: f32,
    pub max_location_age_minutes: u64,
    pub location_interval_secs: u64,
    pub location_min_distance_m: f32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            arm_offset_degrees: DEFAULT_MECHANICAL_OFFSET_DEG,
            max_location_age_minutes: 30,
            location_interval_secs: 3,
            location_min_distance_m: 1.0,
        }
    }
}

/// `[display]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySettings {
    pub speed_unit: SpeedUnit,
}

/// `[logging]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingSettings {
    /// Directory for diagnostic log files. Stderr only when unset.
    pub directory: Option<PathBuf>,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub recording: RecordingSettings,
    pub sensors: SensorSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`]. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    ///
    /// Unknown sections and keys are ignored; known keys with bad values
    /// are an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_error)
    }

    /// Settings for the recording decorator.
    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig::new(self.recording.directory.clone())
            .with_auto_record(self.recording.auto_record)
    }

    /// Settings for the live sensor source.
    pub fn sensor_config(&self) -> SensorSourceConfig {
        SensorSourceConfig {
            mechanical_offset_deg: self.sensors.arm_offset_degrees,
            max_location_age: Duration::from_secs(self.sensors.max_location_age_minutes * 60),
            location_request: LocationRequest {
                min_interval: Duration::from_secs(self.sensors.location_interval_secs),
                min_distance_m: self.sensors.location_min_distance_m,
            },
            ..SensorSourceConfig::default()
        }
    }
}
