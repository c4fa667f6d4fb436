//! Recording orientation events to log files.
//!
//! [`RecordingOrientationSource`] decorates any [`OrientationSource`] and
//! writes one log line per inner event through a [`LogRecorder`]. Recording
//! is best effort: I/O faults end the recording quietly and never reach the
//! live data path.
//!
//! [`OrientationSource`]: crate::orientation::OrientationSource

mod recorder;
mod source;

pub use recorder::LogRecorder;
pub use source::{RecordingConfig, RecordingOrientationSource};
