//! User configuration.
//!
//! Settings live in an INI file at `<config dir>/orientrec/config.ini`. A
//! missing file means defaults; unknown keys are ignored so older builds can
//! read newer files.

mod file;
mod keys;

pub use file::{
    config_directory, config_file_path, default_log_directory, ConfigError, ConfigFile,
    DisplaySettings, LoggingSettings, RecordingSettings, SensorSettings,
};
pub use keys::ConfigKey;
