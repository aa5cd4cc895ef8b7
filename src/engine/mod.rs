//! Sync engine contract.
//!
//! # Data Flow
//! ```text
//! Dispatcher / reload loop
//!     → SyncLibrary::load_config (fetch + publish snapshot)
//!
//! One-shot run
//!     → SyncLibrary::process_components(selection)
//!
//! Message loop
//!     → SyncLibrary::process_message(message)
//!
//! All three read or replace the library's configuration snapshot;
//! callers never touch it directly.
//! ```
//!
//! # Design Decisions
//! - Every call receives the immutable [`Policy`] instead of global setters
//! - The library owns its own synchronization; callers only guarantee that a
//!   single loop never overlaps its own calls

pub mod component;
pub mod library;
pub mod sync;

use async_trait::async_trait;

use crate::bus::Message;
use crate::config::locator::ConfigLocator;
use crate::config::settings::Policy;
use crate::config::store::StoreError;

pub use component::{Component, Namespace, Selection};
pub use library::{Library, RunSummary};
pub use sync::{LoggingSynchronizer, SyncError, SyncRequest, Synchronizer};

/// Operations the service core needs from the sync library.
#[async_trait]
pub trait SyncLibrary: Send + Sync {
    /// Load (or replace) the configuration from `locator`.
    async fn load_config(&self, locator: &ConfigLocator, policy: &Policy) -> Result<(), StoreError>;

    /// Process a component selection. An empty selection means every
    /// configured component. Per-component failures are reported by the
    /// library itself.
    async fn process_components(&self, selection: &Selection, policy: &Policy);

    /// Handle a single bus message.
    async fn process_message(&self, message: &Message, policy: &Policy);
}
