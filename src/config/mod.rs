//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI locator string
//!     → locator.rs (link#ref)
//!     → probe.rs (resolve ref to a commit)
//!     → store.rs (clone, parse, publish snapshot)
//!
//! Every reload interval:
//!     watcher.rs probes the ref
//!     → unchanged or unavailable: nothing happens
//!     → changed: reload through the sync library
//!     → atomic swap of Arc<ConfigSnapshot>
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; a reload replaces the whole snapshot
//! - Probe failures are never fatal once the service is running
//! - A failed reload keeps serving the previous snapshot

pub mod git;
pub mod locator;
pub mod probe;
pub mod settings;
pub mod store;
pub mod watcher;

pub use locator::ConfigLocator;
pub use probe::{GitRefProbe, RefProbe, ResolvedRef};
pub use settings::{LogLevel, Mode, Policy, ServiceSettings};
pub use store::{ConfigSnapshot, ConfigStore};
pub use watcher::{CheckOutcome, ConfigWatcher};
