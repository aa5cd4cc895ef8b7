//! Message consumption loop.
//!
//! # Responsibilities
//! - Subscribe to the bus once
//! - Hand each message to the sync library before accepting the next one
//! - Report why the loop ended
//!
//! # Design Decisions
//! - Strictly sequential: no two messages are processed concurrently
//! - A shutdown request is honoured between messages, never mid-message

use std::sync::Arc;
use tracing::Instrument;

use crate::bus::{BusError, MessageBus};
use crate::config::settings::Policy;
use crate::engine::SyncLibrary;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;

/// Why the message loop stopped.
#[derive(Debug)]
pub enum LoopExit {
    /// The connection could not be established.
    ConnectFailed(BusError),
    /// The connection was lost after subscribing.
    Disconnected,
    /// Shutdown was requested.
    Shutdown,
}

/// Consumes bus messages and forwards them to the sync library.
pub struct MessageLoop {
    bus: Arc<dyn MessageBus>,
    library: Arc<dyn SyncLibrary>,
    policy: Policy,
}

impl MessageLoop {
    pub fn new(bus: Arc<dyn MessageBus>, library: Arc<dyn SyncLibrary>, policy: Policy) -> Self {
        Self {
            bus,
            library,
            policy,
        }
    }

    /// Run until the bus goes away or shutdown is signalled.
    pub async fn run(self, mut shutdown: ShutdownListener) -> LoopExit {
        let mut subscription = match self.bus.subscribe().await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(critical = true, error = %e, "Could not connect to the message bus");
                return LoopExit::ConnectFailed(e);
            }
        };

        tracing::info!("Listening for messages");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Message loop received shutdown signal, exiting loop");
                    return LoopExit::Shutdown;
                }
                next = subscription.recv() => match next {
                    Some(message) => {
                        metrics::record_message();
                        let span = tracing::info_span!(
                            "message",
                            message_id = %uuid::Uuid::new_v4(),
                            topic = %message.topic,
                        );
                        self.library
                            .process_message(&message, &self.policy)
                            .instrument(span)
                            .await;
                    }
                    None => {
                        tracing::error!(critical = true, "Lost the message bus connection");
                        return LoopExit::Disconnected;
                    }
                }
            }
        }
    }
}
