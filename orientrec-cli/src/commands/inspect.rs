//! Inspect command - summarize a recorded log.

use std::path::PathBuf;

use console::style;
use orientrec::config::ConfigFile;
use orientrec::log::{log_start_time, summarize};

use super::common::{
    format_location, format_offset, resolve_log_directory, resolve_log_path, resolve_speed_unit,
    SpeedUnitArg,
};
use crate::error::CliError;

/// Arguments for the inspect command.
pub struct InspectArgs {
    pub log: String,
    pub dir: Option<PathBuf>,
    pub speed_unit: Option<SpeedUnitArg>,
}

/// Run the inspect command.
pub fn run(args: InspectArgs, config: &ConfigFile) -> Result<(), CliError> {
    let log_dir = resolve_log_directory(args.dir, config);
    let path = resolve_log_path(&args.log, &log_dir);
    let unit = resolve_speed_unit(args.speed_unit, config);

    let summary = summarize(&path)
        .map_err(|e| CliError::Io(format!("Cannot read {}", path.display()), e))?;

    println!("Log:        {}", path.display());
    if let Some(started) = log_start_time(&path) {
        println!("Started:    {}", started.with_timezone(&chrono::Local));
    }
    println!("Duration:   {}", format_offset(summary.last_offset_ms));
    println!();
    println!("Orientation events: {}", summary.orientation_events);
    println!("Location events:    {}", summary.location_events);
    println!("Accuracy events:    {}", summary.accuracy_events);
    println!("Total:              {}", summary.total_events());

    if let Some(location) = &summary.first_location {
        println!();
        println!("First fix:  {}", format_location(location, unit));
    }

    if let Some((line, error)) = &summary.error {
        println!();
        println!(
            "{} line {}: {} (replay stops here)",
            style("Malformed").yellow().bold(),
            line,
            error
        );
    }

    Ok(())
}
