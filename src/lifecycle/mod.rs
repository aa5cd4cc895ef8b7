//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate settings → Resolve initial ref → First config load
//!     → batch.rs (one-shot) or supervisor.rs (service)
//!
//! Service (supervisor.rs):
//!     Config watcher task (background)
//!     Message loop (foreground, awaited)
//!     Message loop ends → shutdown watcher → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: every startup error is fatal and has its own exit code
//! - The process lives exactly as long as the message loop
//! - Bus loss is terminal; there is no reconnect

pub mod batch;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use batch::BatchRunner;
pub use shutdown::{Shutdown, ShutdownListener};
pub use startup::{Dispatcher, RunOutcome};
pub use supervisor::ServiceSupervisor;
