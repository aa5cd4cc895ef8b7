//! One-shot processing.

use std::sync::Arc;

use crate::config::settings::Policy;
use crate::engine::{Selection, SyncLibrary};

/// Processes a component selection once.
pub struct BatchRunner {
    library: Arc<dyn SyncLibrary>,
    policy: Policy,
}

impl BatchRunner {
    pub fn new(library: Arc<dyn SyncLibrary>, policy: Policy) -> Self {
        Self { library, policy }
    }

    /// Hand the selection to the library exactly once. Per-component
    /// failures are the library's to report and never fail the run.
    pub async fn run(&self, selection: &Selection) {
        if selection.is_empty() {
            tracing::info!("Processing all configured components");
        } else {
            tracing::info!(count = selection.len(), "Processing selected components");
        }
        self.library.process_components(selection, &self.policy).await;
        tracing::info!("One-shot run finished");
    }
}
