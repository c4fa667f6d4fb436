//! The flat orientation event log.
//!
//! A log is plain ASCII text, one event per line, with no header, footer or
//! checksum. Each line starts with the elapsed milliseconds since the start
//! of the recording followed by a one-letter kind tag (see [`LogRecord`]).
//! Files are named after the capture start in epoch milliseconds with the
//! [`LOG_EXTENSION`] extension.

mod files;
mod record;

pub use files::{
    list_logs, log_file_name, log_start_time, summarize, LogFileInfo, LogSummary, LOG_EXTENSION,
};
pub use record::{LogEvent, LogParseError, LogRecord};
