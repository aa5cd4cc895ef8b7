//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the configuration ref and perform the first load
//! - Build and run either the one-shot batch or the service
//!
//! # Design Decisions
//! - Settings are validated before this point; nothing here runs for an
//!   invalid command line
//! - An unreachable remote at startup is fatal, unlike during polling
//! - The operating policy travels with every call, so it is in force from
//!   the very first load

use std::sync::Arc;

use crate::bus::{MessageBus, MessageLoop};
use crate::config::locator::ConfigLocator;
use crate::config::probe::RefProbe;
use crate::config::settings::{Mode, ServiceSettings};
use crate::config::watcher::ConfigWatcher;
use crate::engine::SyncLibrary;
use crate::error::{StartupError, EXIT_BUS_LOST, EXIT_OK};
use crate::lifecycle::batch::BatchRunner;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::lifecycle::supervisor::ServiceSupervisor;
use crate::observability::metrics;

/// How a run mode finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// One-shot processing completed.
    Completed,
    /// The service was asked to stop.
    Stopped,
    /// The message bus connection was lost or never established.
    BusLost,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Completed | RunOutcome::Stopped => EXIT_OK,
            RunOutcome::BusLost => EXIT_BUS_LOST,
        }
    }
}

/// Wires collaborators into the selected run mode.
pub struct Dispatcher {
    probe: Arc<dyn RefProbe>,
    library: Arc<dyn SyncLibrary>,
    bus: Arc<dyn MessageBus>,
    handle_signals: bool,
}

impl Dispatcher {
    pub fn new(
        probe: Arc<dyn RefProbe>,
        library: Arc<dyn SyncLibrary>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            probe,
            library,
            bus,
            handle_signals: true,
        }
    }

    /// Leave SIGINT/SIGTERM alone; shutdown only through the coordinator.
    pub fn without_signals(mut self) -> Self {
        self.handle_signals = false;
        self
    }

    /// Load the initial configuration and run the selected mode.
    pub async fn run(
        &self,
        settings: &ServiceSettings,
        locator: ConfigLocator,
        shutdown: Shutdown,
    ) -> Result<RunOutcome, StartupError> {
        let policy = &settings.policy;

        let Some(initial) = self.probe.probe(&locator).await else {
            return Err(StartupError::ConfigUnreachable(locator.to_string()));
        };
        tracing::info!(locator = %locator, config_ref = %initial, "Configuration ref resolved");

        if let Err(e) = self.library.load_config(&locator, policy).await {
            metrics::record_config_load(false);
            return Err(StartupError::InitialLoad(e));
        }
        metrics::record_config_load(true);
        tracing::info!("Configuration loaded");

        match settings.mode {
            Mode::OneShot => {
                BatchRunner::new(self.library.clone(), policy.clone())
                    .run(&settings.selection)
                    .await;
                Ok(RunOutcome::Completed)
            }
            Mode::Service => {
                let watcher = ConfigWatcher::new(
                    locator,
                    initial,
                    self.probe.clone(),
                    self.library.clone(),
                    policy.clone(),
                    settings.reload_interval,
                );
                let messages = MessageLoop::new(self.bus.clone(), self.library.clone(), policy.clone());

                let signal_task = self.handle_signals.then(|| signals::forward(shutdown.clone()));
                let outcome = ServiceSupervisor::new(watcher, messages).run(shutdown).await;
                if let Some(task) = signal_task {
                    task.abort();
                }
                Ok(outcome)
            }
        }
    }
}
