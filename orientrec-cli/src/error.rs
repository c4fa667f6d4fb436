//! CLI error type.

use std::fmt;
use std::io;
use std::sync::Arc;

use orientrec::config::ConfigError;
use orientrec::logging::LoggingError;
use orientrec::replay::ReplayError;
use orientrec::service::ServiceError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments or configuration.
    Config(String),
    /// The configuration file could not be read or written.
    ConfigFile(ConfigError),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// A log could not be replayed.
    Replay(Arc<ReplayError>),
    /// The recorder service rejected a request.
    Service(ServiceError),
    /// A filesystem operation failed.
    Io(String, io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging setup failed: {}", e),
            CliError::Replay(e) => write!(f, "Replay failed: {}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Io(context, e) => write!(f, "{}: {}", context, e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Replay(e) => Some(e.as_ref()),
            CliError::Service(e) => Some(e),
            CliError::Io(_, e) => Some(e),
            CliError::Config(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Replay(Arc::new(e))
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl CliError {
    /// Exit with an error message.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(1);
    }
}
