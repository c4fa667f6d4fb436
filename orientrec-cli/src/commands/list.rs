//! List command - show recorded logs.

use std::path::PathBuf;

use chrono::Local;
use orientrec::config::ConfigFile;
use orientrec::log::list_logs;

use super::common::resolve_log_directory;
use crate::error::CliError;

/// Run the list command.
pub fn run(dir: Option<PathBuf>, config: &ConfigFile) -> Result<(), CliError> {
    let log_dir = resolve_log_directory(dir, config);
    let logs = list_logs(&log_dir)
        .map_err(|e| CliError::Io(format!("Cannot list {}", log_dir.display()), e))?;

    println!("Logs in {}", log_dir.display());
    println!();

    if logs.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    for log in &logs {
        let started = log
            .started
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<20} {:<20} {:>10} bytes", log.name, started, log.size);
    }

    println!();
    println!("{} log(s)", logs.len());
    Ok(())
}
