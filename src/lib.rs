//! DistroBaker service core.
//!
//! Keeps a remotely hosted configuration fresh and feeds component work to
//! the sync engine, either once (one-shot) or continuously from a message
//! bus (service).

// Core subsystems
pub mod bus;
pub mod config;
pub mod engine;

// Cross-cutting concerns
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use cli::Cli;
pub use config::{ConfigLocator, ServiceSettings};
pub use engine::{Library, SyncLibrary};
pub use error::StartupError;
pub use lifecycle::{Dispatcher, RunOutcome, Shutdown};
