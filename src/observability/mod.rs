//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reload loop, message loop, engine:
//!     → logging.rs (structured events through tracing)
//!     → metrics.rs (probe, load and message counters)
//!
//! Consumers:
//!     → stderr (fmt layer)
//!     → Prometheus scrape endpoint, when enabled
//! ```
//!
//! # Design Decisions
//! - CLI log level sets the default directive; RUST_LOG still wins
//! - Critical events are ERROR events tagged `critical = true`
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
