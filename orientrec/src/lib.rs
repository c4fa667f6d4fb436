//! OrientRec - head orientation and location recording
//!
//! This library tracks a wearer's heading, pitch, roll and GPS location from
//! device sensors, records that stream to a timestamped log, and replays a
//! logged stream as if it were live.
//!
//! # Architecture
//!
//! ```text
//! SensorHub / LocationProvider ──► SensorOrientationSource ──► RecordingOrientationSource ──► listeners
//!                                                                  │
//!                                                                  ▼
//!                                                            <epoch ms>.om
//!                                                                  │
//!                                                                  ▼
//!                                        ReplayOrientationSource ──► listeners
//! ```
//!
//! All three sources implement [`orientation::OrientationSource`], so a
//! consumer cannot tell live, recorded or replayed data apart other than by
//! asking `is_recording()` / `is_replaying()`.

pub mod config;
pub mod geomag;
pub mod log;
pub mod logging;
pub mod orientation;
pub mod recording;
pub mod replay;
pub mod sensors;
pub mod service;
