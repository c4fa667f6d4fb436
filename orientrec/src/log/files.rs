//! Log file naming, discovery and summaries.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};

use super::record::{LogEvent, LogParseError, LogRecord};
use crate::orientation::Location;

/// Extension of orientation log files.
pub const LOG_EXTENSION: &str = "om";

/// File name for a log started at `started_ms` (milliseconds since the epoch).
pub fn log_file_name(started_ms: i64) -> String {
    format!("{}.{}", started_ms, LOG_EXTENSION)
}

/// Capture start encoded in a log file name, if the stem is a millisecond timestamp.
pub fn log_start_time(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_stem()?.to_str()?;
    let millis: i64 = stem.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// A log file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileInfo {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name, usable as a replay identifier.
    pub name: String,
    /// Capture start, when the name encodes it.
    pub started: Option<DateTime<Utc>>,
    /// Size in bytes.
    pub size: u64,
}

/// List the logs in `dir`, newest first.
///
/// Files are ordered by the timestamp in their name, falling back to the
/// name itself. A missing directory yields an empty list.
pub fn list_logs(dir: &Path) -> io::Result<Vec<LogFileInfo>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut logs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        logs.push(LogFileInfo {
            started: log_start_time(&path),
            size: metadata.len(),
            name,
            path,
        });
    }

    logs.sort_by(|a, b| b.started.cmp(&a.started).then_with(|| b.name.cmp(&a.name)));
    Ok(logs)
}

/// Event counts and extent of a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSummary {
    pub orientation_events: usize,
    pub location_events: usize,
    pub accuracy_events: usize,
    /// Offset of the last event, in milliseconds.
    pub last_offset_ms: u64,
    /// First location recorded.
    pub first_location: Option<Location>,
    /// First line that failed to parse, with its 1-based number.
    pub error: Option<(usize, LogParseError)>,
}

impl LogSummary {
    /// Total number of events read.
    pub fn total_events(&self) -> usize {
        self.orientation_events + self.location_events + self.accuracy_events
    }
}

/// Read a whole log and summarize it.
///
/// Reading stops at the first blank or malformed line, as replay does.
pub fn summarize(path: &Path) -> io::Result<LogSummary> {
    let reader = BufReader::new(File::open(path)?);
    let mut summary = LogSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        let record: LogRecord = match line.parse() {
            Ok(record) => record,
            Err(e) => {
                summary.error = Some((index + 1, e));
                break;
            }
        };

        summary.last_offset_ms = record.offset_ms;
        match record.event {
            LogEvent::Orientation { .. } => summary.orientation_events += 1,
            LogEvent::Location(location) => {
                summary.location_events += 1;
                summary.first_location.get_or_insert(location);
            }
            LogEvent::Accuracy { .. } => summary.accuracy_events += 1,
        }
    }

    Ok(summary)
}
