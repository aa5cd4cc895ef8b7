//! Bounded retries.

use std::fmt::Display;
use std::future::Future;

use crate::resilience::backoff::Backoff;

/// Run `op` up to `attempts` times, sleeping per `backoff` between failures.
///
/// A budget of zero still runs the operation once. The last error is
/// returned when every attempt fails.
pub async fn retry<T, E, F, Fut>(
    what: &str,
    attempts: u32,
    backoff: Backoff,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    attempt,
                    attempts,
                    error = %e,
                    "{} failed, retrying", what
                );
                tokio::time::sleep(backoff.delay(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempts, error = %e, "{} failed, giving up", what);
                return Err(e);
            }
        }
    }
}
