//! The collaborator facade.
//!
//! A user interface needs one handle that renders current values, starts and
//! stops recording, and swaps the live stream for a replay and back.
//! [`RecorderService`] is that handle.

mod error;
mod recorder;

pub use error::ServiceError;
pub use recorder::RecorderService;
