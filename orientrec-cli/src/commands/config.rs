//! `config` subcommands: inspect and edit `config.ini`.
//!
//! Every edit goes through [`ConfigKey::set`], so a value the library would
//! reject at load time is rejected here before anything is written.

use std::path::Path;

use clap::Subcommand;
use console::style;
use orientrec::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value
    Get {
        /// Key as section.key, e.g. sensors.arm_offset_degrees
        key: String,
    },

    /// Validate and store a value
    Set {
        /// Key as section.key, e.g. display.speed_unit
        key: String,

        /// New value
        value: String,
    },

    /// Restore a key to its default
    Unset {
        /// Key as section.key
        key: String,
    },

    /// Show settings, marking those that differ from the defaults
    List {
        /// Only this section (recording, sensors, display, logging)
        #[arg(long)]
        section: Option<String>,
    },

    /// Show where the configuration file lives
    Path,
}

/// Run a config subcommand against the user's configuration file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    run_at(command, &config_file_path())
}

fn run_at(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            let value = key.get(&ConfigFile::load_from(path)?);
            println!("{}", if value.is_empty() { "(not set)" } else { value.as_str() });
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let (old, new) = edit(path, key, &value)?;
            println!("{}: {} -> {}", key, old, style(new).green());
            Ok(())
        }
        ConfigCommands::Unset { key } => {
            let key = lookup(&key)?;
            let default = key.get(&ConfigFile::default());
            let (old, new) = edit(path, key, &default)?;
            println!("{}: {} -> {} (default)", key, old, new);
            Ok(())
        }
        ConfigCommands::List { section } => list(path, section.as_deref()),
        ConfigCommands::Path => {
            let state = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), state);
            Ok(())
        }
    }
}

fn lookup(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        let known: Vec<String> = ConfigKey::all().iter().map(|k| k.name()).collect();
        CliError::Config(format!(
            "Unknown key '{}'. Known keys: {}",
            key,
            known.join(", ")
        ))
    })
}

/// Apply `value` to `key` and save. Returns the stored value before and after.
fn edit(path: &Path, key: ConfigKey, value: &str) -> Result<(String, String), CliError> {
    let mut config = ConfigFile::load_from(path)?;
    let old = key.get(&config);
    key.set(&mut config, value)?;
    config.save_to(path)?;
    Ok((old, key.get(&config)))
}

fn list(path: &Path, section: Option<&str>) -> Result<(), CliError> {
    let keys: Vec<ConfigKey> = ConfigKey::all()
        .iter()
        .copied()
        .filter(|k| section.map_or(true, |s| k.section().eq_ignore_ascii_case(s)))
        .collect();
    if keys.is_empty() {
        return Err(CliError::Config(format!(
            "No settings in section '{}'",
            section.unwrap_or_default()
        )));
    }

    let config = ConfigFile::load_from(path)?;
    let defaults = ConfigFile::default();
    let width = keys.iter().map(|k| k.name().len()).max().unwrap_or(0);

    for key in keys {
        let value = key.get(&config);
        let shown = if value.is_empty() { "(not set)" } else { value.as_str() };
        if value == key.get(&defaults) {
            println!("{:<width$}  {}", key.name(), shown, width = width);
        } else {
            println!(
                "{:<width$}  {}",
                key.name(),
                style(shown).bold(),
                width = width
            );
        }
    }
    Ok(())
}
