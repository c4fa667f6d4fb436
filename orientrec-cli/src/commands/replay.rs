//! Replay command - play a recorded log back in real time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orientrec::config::ConfigFile;
use orientrec::orientation::{ChangeKind, OrientationReader, OrientationSource, SpeedUnit};
use orientrec::replay::{ReplayOrientationSource, ReplayOutcome};
use tracing::debug;

use super::common::{
    format_attitude, format_location, interrupt_flag, resolve_log_directory, resolve_log_path,
    resolve_speed_unit, SpeedUnitArg,
};
use crate::error::CliError;

/// How often the interrupt flag is polled while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Arguments for the replay command.
pub struct ReplayArgs {
    pub log: String,
    pub dir: Option<PathBuf>,
    pub speed_unit: Option<SpeedUnitArg>,
    pub quiet: bool,
}

/// Print one replayed event.
pub fn print_event(kind: ChangeKind, source: &dyn OrientationReader, unit: SpeedUnit) {
    let tag = super::kind_tag(kind);
    match kind {
        ChangeKind::Orientation => println!("{} {}", tag, format_attitude(&source.snapshot())),
        ChangeKind::Location => match source.location() {
            Some(location) => println!("{} {}", tag, format_location(&location, unit)),
            None => println!("{} (no fix)", tag),
        },
        ChangeKind::Accuracy => {
            let state = if source.has_interference() {
                "magnetic interference"
            } else {
                "compass reliable"
            };
            println!("{} {}", tag, state);
        }
    }
}

/// Run the replay command.
pub fn run(args: ReplayArgs, config: &ConfigFile) -> Result<(), CliError> {
    let log_dir = resolve_log_directory(args.dir, config);
    let path = resolve_log_path(&args.log, &log_dir);
    let unit = resolve_speed_unit(args.speed_unit, config);

    let replay = ReplayOrientationSource::open(&path)?;

    let counted = Arc::new(AtomicUsize::new(0));
    {
        let counted = counted.clone();
        let quiet = args.quiet;
        replay.add_listener(Arc::new(
            move |kind: ChangeKind, source: &dyn OrientationReader| {
                counted.fetch_add(1, Ordering::Relaxed);
                if !quiet {
                    print_event(kind, source, unit);
                }
            },
        ));
    }

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    replay.add_finish_listener(Arc::new(move |outcome: &ReplayOutcome| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(outcome.clone());
        }
    }));

    let interrupted = interrupt_flag()?;

    println!("Replaying {}", path.display());
    println!("Press Ctrl+C to stop");
    println!();

    replay.start();

    let outcome = loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(outcome) => break outcome,
            Err(RecvTimeoutError::Timeout) => {
                if interrupted.load(Ordering::SeqCst) {
                    debug!("Interrupt received, stopping replay");
                    replay.stop();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break ReplayOutcome::Stopped,
        }
    };
    replay.wait();

    println!();
    println!("Replay {} ({} events)", outcome, counted.load(Ordering::Relaxed));

    match outcome {
        ReplayOutcome::Failed(e) => Err(CliError::Replay(e)),
        _ => Ok(()),
    }
}
