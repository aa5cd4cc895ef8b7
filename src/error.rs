//! Startup error taxonomy and process exit codes.

use thiserror::Error;

use crate::bus::BusError;
use crate::config::locator::LocatorError;
use crate::config::settings::InvalidLogLevel;
use crate::config::store::StoreError;

/// Normal completion.
pub const EXIT_OK: u8 = 0;
/// Invalid command line.
pub const EXIT_USAGE: u8 = 1;
/// The message bus went away while running as a service.
pub const EXIT_BUS_LOST: u8 = 3;
/// Configuration unreachable or unloadable at startup.
pub const EXIT_CONFIG: u8 = 128;

/// Failures that abort the process before either run mode starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    LogLevel(#[from] InvalidLogLevel),

    #[error("component selection requires --oneshot")]
    SelectionWithoutOneShot,

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(String),

    #[error("cannot resolve configuration ref for {0}")]
    ConfigUnreachable(String),

    #[error("initial configuration load failed: {0}")]
    InitialLoad(#[source] StoreError),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::ConfigUnreachable(_) | StartupError::InitialLoad(_) => EXIT_CONFIG,
            _ => EXIT_USAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(StartupError::SelectionWithoutOneShot.exit_code(), 1);
        assert_eq!(
            StartupError::LogLevel(InvalidLogLevel("LOUD".into())).exit_code(),
            1
        );
        assert_eq!(StartupError::ConfigUnreachable("c#main".into()).exit_code(), 128);
        assert_eq!(
            StartupError::InitialLoad(StoreError::Missing("distrobaker.toml".into())).exit_code(),
            128
        );
    }
}
