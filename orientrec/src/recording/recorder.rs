//! Best-effort log writer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::log::{log_file_name, LogEvent, LogRecord};
use crate::orientation::{ChangeKind, OrientationReader};

/// An open log file.
struct LogWriter {
    path: PathBuf,
    out: BufWriter<File>,
    started: Instant,
    lines: usize,
}

impl LogWriter {
    /// Create a new log in `directory` named after the current time.
    ///
    /// Never truncates an existing log: if the name is taken, the next free
    /// millisecond is used.
    fn create(directory: &Path) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        let mut started_ms = Utc::now().timestamp_millis();
        loop {
            let path = directory.join(log_file_name(started_ms));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        out: BufWriter::new(file),
                        started: Instant::now(),
                        lines: 0,
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => started_ms += 1,
                Err(e) => return Err(e),
            }
        }
    }

    fn write(&mut self, event: LogEvent) -> io::Result<()> {
        let offset_ms = self.started.elapsed().as_millis() as u64;
        writeln!(self.out, "{}", LogRecord::new(offset_ms, event))?;
        self.lines += 1;
        Ok(())
    }
}

/// Writes orientation events to timestamped log files.
///
/// All I/O faults are swallowed: a log that cannot be opened is simply not
/// started, and a failed write or flush ends the recording. Faults are
/// reported through `tracing` only.
pub struct LogRecorder {
    directory: PathBuf,
    writer: Mutex<Option<LogWriter>>,
}

impl std::fmt::Debug for LogRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRecorder")
            .field("directory", &self.directory)
            .field("current_log", &self.current_log())
            .finish()
    }
}

impl LogRecorder {
    /// Create a recorder that writes into `directory` (created on demand).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            writer: Mutex::new(None),
        }
    }

    /// Directory new logs are created in.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Open a new log unless one is already open.
    ///
    /// Returns true if a new log was opened.
    pub fn start(&self) -> bool {
        let mut writer = self.writer.lock();
        if writer.is_some() {
            return false;
        }
        match LogWriter::create(&self.directory) {
            Ok(opened) => {
                info!(path = %opened.path.display(), "Recording started");
                *writer = Some(opened);
                true
            }
            Err(e) => {
                warn!(directory = %self.directory.display(), error = %e, "Could not open log; not recording");
                false
            }
        }
    }

    /// Flush and close the current log, if any.
    pub fn stop(&self) {
        let Some(mut writer) = self.writer.lock().take() else {
            return;
        };
        match writer.out.flush() {
            Ok(()) => info!(
                path = %writer.path.display(),
                lines = writer.lines,
                "Recording stopped"
            ),
            Err(e) => warn!(path = %writer.path.display(), error = %e, "Could not flush log"),
        }
    }

    /// Whether a log is open.
    pub fn is_recording(&self) -> bool {
        self.writer.lock().is_some()
    }

    /// Path of the open log.
    pub fn current_log(&self) -> Option<PathBuf> {
        self.writer.lock().as_ref().map(|w| w.path.clone())
    }

    /// Append an event. Does nothing when no log is open.
    pub fn write(&self, event: LogEvent) {
        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return;
        };
        if let Err(e) = writer.write(event) {
            warn!(path = %writer.path.display(), error = %e, "Log write failed; recording stopped");
            *guard = None;
        }
    }

    /// Append the current values of `source` for a change of `kind`.
    pub fn record(&self, kind: ChangeKind, source: &dyn OrientationReader) {
        match LogEvent::capture(kind, source) {
            Some(event) => self.write(event),
            None => debug!(%kind, "Nothing to record"),
        }
    }
}

impl Drop for LogRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}
