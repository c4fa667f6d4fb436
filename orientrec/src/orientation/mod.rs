//! The orientation source contract shared by live, recording and replay sources.
//!
//! A source owns (or, for the recording decorator, forwards) the composite
//! [`OrientationSample`] state and fires a [`ChangeKind`] notification to every
//! registered [`ChangeListener`] whenever one aspect of that state changes.
//! Notifications carry no payload: listeners re-query the source they are
//! handed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use orientrec::orientation::{ChangeKind, OrientationReader, SharedListener};
//!
//! let listener: SharedListener = Arc::new(|kind: ChangeKind, source: &dyn OrientationReader| {
//!     if kind == ChangeKind::Orientation {
//!         println!("heading {:.1}°", source.heading());
//!     }
//! });
//! # let _ = listener;
//! ```

mod listener;
mod source;
mod state;
mod units;

pub(crate) use listener::same_handle;
pub use listener::{ChangeListener, ListenerSet, SharedListener};
pub use source::{OrientationReader, OrientationSource};
pub use state::{ChangeKind, Location, OrientationSample};
pub use units::SpeedUnit;
