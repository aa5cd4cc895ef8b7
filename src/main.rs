//! DistroBaker
//!
//! Distribution git sync and build automation.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                 DISTROBAKER                   │
//!                 │                                               │
//!   CLI ─────────▶│  dispatcher ──▶ initial ref + first load      │
//!                 │       │                                       │
//!                 │       ├──▶ one-shot: batch ──▶ sync engine    │
//!                 │       │                                       │
//!                 │       └──▶ service: supervisor                │
//!                 │              ├─ config watcher (background)   │
//!   Config repo ◀─┼──────────────┤   probe ref, reload on change  │
//!                 │              └─ message loop (foreground)     │
//!   Message bus ──┼─────────────────▶ one message at a time       │
//!                 └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use distrobaker::bus::WebSocketBus;
use distrobaker::config::{ConfigStore, GitRefProbe, LogLevel};
use distrobaker::engine::{Library, LoggingSynchronizer};
use distrobaker::error::StartupError;
use distrobaker::observability::{logging, metrics};
use distrobaker::{Cli, ConfigLocator, Dispatcher, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(Cli::parse_error_code(&e));
        }
    };

    // An invalid level is reported at the default level below.
    logging::init(cli.loglevel.parse().unwrap_or(LogLevel::Info));
    tracing::info!("DistroBaker starting");

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(critical = true, error = %e, "Startup failed, exiting");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<u8, StartupError> {
    let settings = cli.settings()?;
    let locator: ConfigLocator = cli.config.parse()?;
    let bus = WebSocketBus::new(&cli.bus)?;

    if let Some(addr) = cli.metrics {
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    tracing::info!(
        locator = %locator,
        mode = ?settings.mode,
        log_level = %settings.policy.log_level,
        retries = settings.policy.retries,
        dry_run = settings.policy.dry_run,
        update_secs = settings.reload_interval.as_secs(),
        "Settings applied"
    );

    let store = Arc::new(ConfigStore::new(cli.workdir()));
    let library = Arc::new(Library::new(store, Arc::new(LoggingSynchronizer)));
    let dispatcher = Dispatcher::new(Arc::new(GitRefProbe::new()), library, Arc::new(bus));

    let outcome = dispatcher.run(&settings, locator, Shutdown::new()).await?;
    Ok(outcome.exit_code())
}
