//! orientrec CLI - record, replay and inspect orientation logs.
//!
//! Thin front end over the `orientrec` library: each subcommand lives in
//! its own module under `commands/`.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orientrec::config::ConfigFile;
use orientrec::logging::{self, LoggingOptions};
use tracing::{debug, warn};

use commands::common::SpeedUnitArg;
use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::replay::ReplayArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "orientrec")]
#[command(version, about = "Record and replay head orientation and GPS streams", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded logs, newest first
    List {
        /// Log directory (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Summarize a recorded log
    Inspect {
        /// Log file name or path
        log: String,

        /// Log directory used to resolve bare names (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Unit for speeds (default: from config)
        #[arg(long, value_enum)]
        speed_unit: Option<SpeedUnitArg>,
    },

    /// Replay a recorded log in real time
    Replay {
        /// Log file name or path
        log: String,

        /// Log directory used to resolve bare names (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Unit for speeds (default: from config)
        #[arg(long, value_enum)]
        speed_unit: Option<SpeedUnitArg>,

        /// Only print the outcome
        #[arg(short, long)]
        quiet: bool,
    },

    /// Drive the pipeline from synthetic sensor data
    Simulate {
        /// Length of the run in seconds
        #[arg(long, default_value = "30")]
        duration: u64,

        /// Attitude readings per second
        #[arg(long, default_value = "10")]
        rate: u32,

        /// Latitude of the track centre
        #[arg(long, default_value = "47.6062", allow_hyphen_values = true)]
        latitude: f64,

        /// Longitude of the track centre
        #[arg(long, default_value = "-122.3321", allow_hyphen_values = true)]
        longitude: f64,

        /// Log directory (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Do not write a log
        #[arg(long)]
        no_record: bool,

        /// Replay the log once the run ends
        #[arg(long, conflicts_with = "no_record")]
        replay: bool,

        /// Unit for speeds (default: from config)
        #[arg(long, value_enum)]
        speed_unit: Option<SpeedUnitArg>,

        /// Only print the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn run(cli: Cli, config: &ConfigFile) -> Result<(), CliError> {
    match cli.command {
        Commands::List { dir } => commands::list::run(dir, config),
        Commands::Inspect {
            log,
            dir,
            speed_unit,
        } => commands::inspect::run(
            InspectArgs {
                log,
                dir,
                speed_unit,
            },
            config,
        ),
        Commands::Replay {
            log,
            dir,
            speed_unit,
            quiet,
        } => commands::replay::run(
            ReplayArgs {
                log,
                dir,
                speed_unit,
                quiet,
            },
            config,
        ),
        Commands::Simulate {
            duration,
            rate,
            latitude,
            longitude,
            dir,
            no_record,
            replay,
            speed_unit,
            quiet,
        } => commands::simulate::run(
            SimulateArgs {
                duration,
                rate,
                latitude,
                longitude,
                dir,
                no_record,
                replay,
                speed_unit,
                quiet,
            },
            config,
        ),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match ConfigFile::load() {
        Ok(config) => (config, None),
        Err(e) => (ConfigFile::default(), Some(e)),
    };

    let options = LoggingOptions {
        verbose: cli.verbose,
        directory: config.logging.directory.clone(),
    };
    let guard = match logging::init(&options) {
        Ok(guard) => guard,
        Err(e) => CliError::from(e).exit(),
    };

    if let Some(e) = config_error {
        warn!(error = %e, "Using default configuration");
    }
    debug!(version = env!("CARGO_PKG_VERSION"), "orientrec starting");

    let result = run(cli, &config);
    drop(guard);
    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_simulate_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "orientrec",
            "simulate",
            "--latitude",
            "-33.86",
            "--longitude",
            "151.21",
            "--no-record",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                latitude,
                no_record,
                ..
            } => {
                assert_eq!(latitude, -33.86);
                assert!(no_record);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_replay_conflicts_with_no_record() {
        assert!(
            Cli::try_parse_from(["orientrec", "simulate", "--no-record", "--replay"]).is_err()
        );
    }
}
