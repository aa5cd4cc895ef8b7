//! Service supervision.
//!
//! # Responsibilities
//! - Run the config watcher in the background
//! - Run the message loop in the foreground and wait for it
//! - Stop the watcher once the message loop is done

use std::time::Duration;

use crate::bus::{LoopExit, MessageLoop};
use crate::config::watcher::ConfigWatcher;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup::RunOutcome;

/// How long a stopping watcher may take before it is aborted.
pub const WATCHER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Binds the service lifetime to the message loop.
pub struct ServiceSupervisor {
    watcher: ConfigWatcher,
    messages: MessageLoop,
}

impl ServiceSupervisor {
    pub fn new(watcher: ConfigWatcher, messages: MessageLoop) -> Self {
        Self { watcher, messages }
    }

    /// Run until the message loop ends. The watcher is cancelled and
    /// joined, or aborted after [`WATCHER_STOP_TIMEOUT`], before returning.
    pub async fn run(self, shutdown: Shutdown) -> RunOutcome {
        let mut reload = tokio::spawn(self.watcher.run(shutdown.subscribe()));

        let exit = self.messages.run(shutdown.subscribe()).await;
        let outcome = match exit {
            LoopExit::Shutdown => RunOutcome::Stopped,
            LoopExit::Disconnected | LoopExit::ConnectFailed(_) => {
                tracing::error!(critical = true, "Message bus unavailable, stopping service");
                RunOutcome::BusLost
            }
        };

        shutdown.trigger();
        match tokio::time::timeout(WATCHER_STOP_TIMEOUT, &mut reload).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Config watcher task ended abnormally"),
            Err(_) => {
                tracing::warn!("Config watcher did not stop in time, aborting it");
                reload.abort();
            }
        }

        tracing::info!(?outcome, "Service stopped");
        outcome
    }
}
