//! Replaying recorded logs as a live-looking orientation source.
//!
//! [`ReplayOrientationSource`] reads a log on its own thread and re-emits
//! each line once the elapsed time since `start()` reaches the line's offset.
//! Cancellation goes through a [`CancelSignal`], which wakes the worker out
//! of its sleep immediately.
//!
//! Malformed or unreadable input ends a run the same way end-of-input does.
//! The [`ReplayOutcome`] handed to [`ReplayListener`]s tells the cases apart.

mod error;
mod signal;
mod source;

pub use error::{ReplayError, ReplayOutcome};
pub use signal::CancelSignal;
pub use source::{
    ReplayListener, ReplayOrientationSource, ReplayPhase, SharedReplayListener,
    REPLAY_THREAD_NAME,
};
