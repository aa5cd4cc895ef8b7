//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Retryable operation (configuration fetch):
//!     → retries.rs (bounded attempts, warning per failure)
//!     → backoff.rs (jittered delay between attempts)
//! ```
//!
//! # Design Decisions
//! - Attempt budgets come from the operating policy, never hard-coded
//! - Polling loops do not use these helpers; their period is the retry

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::retry;
