//! Process-wide operating settings.
//!
//! # Design Decisions
//! - Computed once by the dispatcher and never mutated afterwards
//! - The [`Policy`] part is handed by reference to every collaborator call
//!   instead of being pushed into global state

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::engine::Selection;

/// Error returned for an unknown severity name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid log level: {0}")]
pub struct InvalidLogLevel(pub String);

/// Standard severity names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Name used in `tracing` filter directives. `Critical` has no
    /// dedicated level in `tracing` and shares `error`.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = InvalidLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            "ERROR" => Ok(LogLevel::Error),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Critical => "CRITICAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        };
        f.write_str(name)
    }
}

/// Operating policy shared with the sync library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub log_level: LogLevel,
    /// Attempts for retryable operations inside the library.
    pub retries: u32,
    /// Skip uploads, pushes and builds.
    pub dry_run: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            retries: 3,
            dry_run: false,
        }
    }
}

/// Operating mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reload loop plus message consumption until the bus goes away.
    Service,
    /// Process the selection once and exit.
    OneShot,
}

/// Everything the dispatcher needs to build either run mode.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub mode: Mode,
    pub policy: Policy,
    /// Delay between two remote ref checks.
    pub reload_interval: Duration,
    /// `namespace/component` tokens; only meaningful in one-shot mode.
    pub selection: Selection,
}

impl ServiceSettings {
    /// Convert the CLI's interval in minutes.
    pub fn interval_from_minutes(minutes: u64) -> Duration {
        Duration::from_secs(minutes.saturating_mul(60))
    }
}
