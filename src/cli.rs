//! Command line interface.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::settings::{LogLevel, Mode, Policy, ServiceSettings};
use crate::engine::Selection;
use crate::error::{StartupError, EXIT_OK, EXIT_USAGE};

#[derive(Debug, Parser)]
#[command(name = "distrobaker")]
#[command(about = "Distribution git sync and build automation", version)]
pub struct Cli {
    /// Configuration repository in the link#ref form
    pub config: String,

    /// Logging level for the sync engine
    #[arg(short = 'l', long = "loglevel", default_value = "INFO")]
    pub loglevel: String,

    /// Configuration refresh interval in minutes
    #[arg(
        short = 'u',
        long = "update",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub update: u64,

    /// Number of retries on network failures
    #[arg(short = 'r', long = "retry", default_value_t = 3)]
    pub retry: u32,

    /// Sync all components and exit
    #[arg(short = '1', long = "oneshot")]
    pub oneshot: bool,

    /// Do not upload, push or build anything
    #[arg(short = 'd', visible_short_alias = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Space-separated namespace/component list to sync; requires --oneshot
    #[arg(short = 's', long = "select", value_name = "COMPONENTS")]
    pub select: Option<String>,

    /// Message bus endpoint
    #[arg(long, env = "DISTROBAKER_BUS", default_value = "ws://127.0.0.1:9919/bus")]
    pub bus: String,

    /// Directory for configuration checkouts
    #[arg(long, env = "DISTROBAKER_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long = "metrics", value_name = "ADDR")]
    pub metrics: Option<SocketAddr>,
}

impl Cli {
    /// Validate flag combinations and build the process settings.
    ///
    /// Runs before any network or configuration activity.
    pub fn settings(&self) -> Result<ServiceSettings, StartupError> {
        let log_level: LogLevel = self.loglevel.parse()?;

        if self.select.is_some() && !self.oneshot {
            return Err(StartupError::SelectionWithoutOneShot);
        }

        Ok(ServiceSettings {
            mode: if self.oneshot { Mode::OneShot } else { Mode::Service },
            policy: Policy {
                log_level,
                retries: self.retry,
                dry_run: self.dry_run,
            },
            reload_interval: ServiceSettings::interval_from_minutes(self.update),
            selection: self
                .select
                .as_deref()
                .map(Selection::parse)
                .unwrap_or_default(),
        })
    }

    /// Exit code for a command line clap refused to parse. Help and
    /// version requests are not failures.
    pub fn parse_error_code(err: &clap::Error) -> u8 {
        if err.use_stderr() {
            EXIT_USAGE
        } else {
            EXIT_OK
        }
    }

    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
