//! Hand-off point to the repository sync and build machinery.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::settings::Policy;
use crate::engine::component::Component;

/// A single sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub component: Component,
    /// Build that triggered the request, when it came from the bus.
    pub nvr: Option<String>,
}

/// Failure reported by a [`Synchronizer`].
#[derive(Debug, Error)]
#[error("synchronization of {component} failed: {reason}")]
pub struct SyncError {
    pub component: String,
    pub reason: String,
}

/// Performs repository sync (and builds) for one component.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    async fn sync(&self, request: &SyncRequest, policy: &Policy) -> Result<(), SyncError>;
}

/// Synchronizer that only records requests in the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingSynchronizer;

#[async_trait]
impl Synchronizer for LoggingSynchronizer {
    async fn sync(&self, request: &SyncRequest, policy: &Policy) -> Result<(), SyncError> {
        if policy.dry_run {
            tracing::info!(
                component = %request.component,
                nvr = request.nvr.as_deref().unwrap_or("-"),
                "Dry run, would synchronize"
            );
        } else {
            tracing::info!(
                component = %request.component,
                nvr = request.nvr.as_deref().unwrap_or("-"),
                retries = policy.retries,
                "Synchronization requested"
            );
        }
        Ok(())
    }
}
