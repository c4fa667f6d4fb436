//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use orientrec::config::ConfigFile;
use orientrec::orientation::{Location, OrientationSample, SpeedUnit};

use crate::error::CliError;

/// Speed unit selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum SpeedUnitArg {
    /// Kilometres per hour
    Kmh,
    /// Miles per hour
    Mph,
    /// Knots
    Kt,
    /// Metres per second
    Mps,
}

impl From<SpeedUnitArg> for SpeedUnit {
    fn from(arg: SpeedUnitArg) -> Self {
        match arg {
            SpeedUnitArg::Kmh => SpeedUnit::KilometresPerHour,
            SpeedUnitArg::Mph => SpeedUnit::MilesPerHour,
            SpeedUnitArg::Kt => SpeedUnit::Knots,
            SpeedUnitArg::Mps => SpeedUnit::MetresPerSecond,
        }
    }
}

/// Resolve the speed unit from CLI args and config.
pub fn resolve_speed_unit(cli_unit: Option<SpeedUnitArg>, config: &ConfigFile) -> SpeedUnit {
    cli_unit
        .map(SpeedUnit::from)
        .unwrap_or(config.display.speed_unit)
}

/// Resolve the log directory from CLI args and config.
pub fn resolve_log_directory(cli_dir: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    cli_dir.unwrap_or_else(|| config.recording.directory.clone())
}

/// Resolve a log argument: a bare file name is looked up in the log
/// directory, anything else is taken as a path.
pub fn resolve_log_path(log: &str, log_dir: &Path) -> PathBuf {
    let as_path = Path::new(log);
    if as_path.components().count() == 1 && !as_path.exists() {
        log_dir.join(log)
    } else {
        as_path.to_path_buf()
    }
}

/// Install a Ctrl+C handler and return the flag it raises.
pub fn interrupt_flag() -> Result<Arc<AtomicBool>, CliError> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;
    Ok(interrupted)
}

/// Format milliseconds as `m:ss.mmm`.
pub fn format_offset(ms: u64) -> String {
    format!("{}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

/// One-line description of a fix.
pub fn format_location(location: &Location, unit: SpeedUnit) -> String {
    format!(
        "{:.6}, {:.6}  alt {:.1} m  bearing {:.0}°  speed {:.1} {}  ±{:.0} m",
        location.latitude,
        location.longitude,
        location.altitude,
        location.bearing,
        unit.convert_mps(location.speed),
        unit.label(),
        location.accuracy
    )
}

/// One-line description of the attitude.
pub fn format_attitude(sample: &OrientationSample) -> String {
    format!(
        "heading {:6.1}°  pitch {:6.1}°  roll {:6.1}°",
        sample.heading, sample.pitch, sample.roll
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0), "0:00.000");
        assert_eq!(format_offset(61_005), "1:01.005");
    }

    #[test]
    fn test_resolve_log_path() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            resolve_log_path("1000.om", temp.path()),
            temp.path().join("1000.om")
        );
        let explicit = temp.path().join("other").join("2000.om");
        let explicit_str = explicit.to_str().unwrap();
        assert_eq!(resolve_log_path(explicit_str, temp.path()), explicit);
    }

    #[test]
    fn test_speed_unit_precedence() {
        let mut config = ConfigFile::default();
        config.display.speed_unit = SpeedUnit::Knots;
        assert_eq!(resolve_speed_unit(None, &config), SpeedUnit::Knots);
        assert_eq!(
            resolve_speed_unit(Some(SpeedUnitArg::Mph), &config),
            SpeedUnit::MilesPerHour
        );
    }
}
