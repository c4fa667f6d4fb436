//! Simulate command - drive the live pipeline from synthetic sensor data.
//!
//! Useful without hardware: a mock hub stands in for the sensors and emits a
//! slow walk around a circle, so the recorder and replay paths can be
//! exercised end to end.

use std::f64::consts::TAU;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use orientrec::config::ConfigFile;
use orientrec::orientation::{ChangeKind, Location, OrientationReader, OrientationSource};
use orientrec::recording::RecordingConfig;
use orientrec::replay::ReplayOutcome;
use orientrec::sensors::{MockSensorHub, SensorAccuracy, SensorKind, SensorOrientationSource};
use orientrec::service::RecorderService;
use tracing::{debug, info};

use super::common::{interrupt_flag, resolve_log_directory, resolve_speed_unit, SpeedUnitArg};
use super::replay::print_event;
use crate::error::CliError;

/// Walk radius in degrees of latitude (about 100 m).
const TRACK_RADIUS_DEG: f64 = 0.0009;

/// Metres per degree of latitude.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub duration: u64,
    pub rate: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub dir: Option<PathBuf>,
    pub no_record: bool,
    pub replay: bool,
    pub speed_unit: Option<SpeedUnitArg>,
    pub quiet: bool,
}

/// Position on the synthetic track `t` seconds in.
fn track_point(args: &SimulateArgs, t: f64) -> Location {
    let angle = TAU * t / args.duration.max(1) as f64;
    let lat = args.latitude + TRACK_RADIUS_DEG * angle.sin();
    let lon_scale = args.latitude.to_radians().cos().max(0.01);
    let lon = args.longitude + TRACK_RADIUS_DEG * angle.cos() / lon_scale;

    // Tangent of the circle, clockwise from north.
    let bearing = (360.0 - angle.to_degrees()).rem_euclid(360.0) as f32;
    let speed = (TAU * TRACK_RADIUS_DEG * METRES_PER_DEGREE / args.duration.max(1) as f64) as f32;

    Location::new(lat, lon, 40.0 + 5.0 * angle.sin())
        .with_motion(bearing, speed, 5.0)
        .with_time(Utc::now())
}

/// Emit synthetic readings until the duration elapses or `stop` is raised.
fn drive(hub: &MockSensorHub, args: &SimulateArgs, stop: &AtomicBool) {
    let period = Duration::from_secs_f64(1.0 / args.rate.max(1) as f64);
    let started = Instant::now();
    let total = Duration::from_secs(args.duration);
    let mut tick: u64 = 0;

    while started.elapsed() < total && !stop.load(Ordering::SeqCst) {
        let t = started.elapsed().as_secs_f64();
        let sweep = (t * 15.0) % 360.0;
        let nod = 20.0 * (t * 0.5).sin();

        hub.emit_attitude(sweep as f32, nod as f32);
        hub.emit_gravity((1.5 * (t * 0.7).sin()) as f32, 9.7, 0.4);

        // Once per second: a fix, and a short burst of interference every ten.
        if tick % args.rate.max(1) as u64 == 0 {
            hub.emit_location(track_point(args, t));
            match t as u64 % 10 {
                5 => hub.emit_accuracy(SensorKind::MagneticField, SensorAccuracy::Low),
                7 => hub.emit_accuracy(SensorKind::MagneticField, SensorAccuracy::High),
                _ => {}
            }
        }

        tick += 1;
        let next = started + period * tick as u32;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    if args.rate == 0 {
        return Err(CliError::Config("--rate must be at least 1".to_string()));
    }

    let log_dir = resolve_log_directory(args.dir.clone(), config);
    let unit = resolve_speed_unit(args.speed_unit, config);

    let hub = Arc::new(MockSensorHub::new());
    hub.set_last_known_location(Some(track_point(&args, 0.0)));
    let live = Arc::new(SensorOrientationSource::new(
        hub.clone(),
        hub.clone(),
        config.sensor_config(),
    ));
    let recording = RecordingConfig::new(&log_dir).with_auto_record(!args.no_record);
    let service = Arc::new(RecorderService::new(live, recording).with_speed_unit(unit));

    if !args.quiet {
        service.add_listener(Arc::new(
            move |kind: ChangeKind, source: &dyn OrientationReader| {
                print_event(kind, source, unit);
            },
        ));
    }

    let interrupted = interrupt_flag()?;

    println!(
        "Simulating {} s at {} Hz around {:.5}, {:.5}",
        args.duration, args.rate, args.latitude, args.longitude
    );
    println!("Press Ctrl+C to stop");
    println!();

    service.start();
    let log = service.current_log();
    info!(log = ?log, "Simulation started");

    drive(&hub, &args, &interrupted);
    service.stop();

    if let Some(speed) = service.display_speed() {
        debug!(speed, unit = %unit, "Final speed");
    }

    println!();
    let Some(log) = log else {
        println!("Not recorded");
        return Ok(());
    };
    println!("Recorded to {}", log.display());

    if !args.replay || interrupted.load(Ordering::SeqCst) {
        return Ok(());
    }

    let name = log
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    service.add_replay_listener(Arc::new(move |outcome: &ReplayOutcome| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(outcome.clone());
        }
    }));

    println!();
    println!("Replaying {}", name);
    println!();
    service.start_replaying(&name)?;

    let outcome = loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(outcome) => break outcome,
            Err(RecvTimeoutError::Timeout) => {
                if interrupted.load(Ordering::SeqCst) {
                    service.stop_replaying();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break ReplayOutcome::Stopped,
        }
    };
    service.stop_replaying();

    println!();
    println!("Replay {}", outcome);
    match outcome {
        ReplayOutcome::Failed(e) => Err(CliError::Replay(e)),
        _ => Ok(()),
    }
}
