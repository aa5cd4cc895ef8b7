//! Remote ref resolution.
//!
//! # Responsibilities
//! - Ask the remote for the commit a branch currently points to
//! - Collapse every failure into "unavailable" so pollers can retry
//!
//! # Design Decisions
//! - Only the `heads` namespace is queried; tags are never resolved
//! - Any stderr output counts as a failure, even with exit status 0

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::config::git;
use crate::config::locator::ConfigLocator;

/// A resolved, opaque commit identifier. Compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedRef(String);

impl ResolvedRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the current commit of a locator's ref.
#[async_trait]
pub trait RefProbe: Send + Sync {
    /// Returns `None` when the remote could not be queried.
    async fn probe(&self, locator: &ConfigLocator) -> Option<ResolvedRef>;
}

/// [`RefProbe`] backed by `git ls-remote --heads`.
///
/// A query that outlives the timeout is killed and reported unavailable.
#[derive(Debug, Clone)]
pub struct GitRefProbe {
    timeout: Duration,
}

impl GitRefProbe {
    pub fn new() -> Self {
        Self {
            timeout: git::LS_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for GitRefProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefProbe for GitRefProbe {
    async fn probe(&self, locator: &ConfigLocator) -> Option<ResolvedRef> {
        let mut cmd = git::command();
        cmd.arg("ls-remote")
            .arg("--heads")
            .arg(&locator.link)
            .arg(locator.ref_or_default());

        let output = match git::output_within(&mut cmd, self.timeout).await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                tracing::warn!(link = %locator.link, error = %e, "git ls-remote timed out");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to spawn git ls-remote");
                return None;
            }
        };

        if !output.stderr.is_empty() {
            tracing::debug!(
                link = %locator.link,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git ls-remote reported an error"
            );
            return None;
        }
        if !output.status.success() {
            return None;
        }

        parse_ls_remote(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Take the object id from the first line of `ls-remote` output.
fn parse_ls_remote(stdout: &str) -> Option<ResolvedRef> {
    stdout
        .split_whitespace()
        .next()
        .map(ResolvedRef::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ls_remote() {
        let out = "3f2a9c0d1e\trefs/heads/main\n";
        assert_eq!(parse_ls_remote(out), Some(ResolvedRef::new("3f2a9c0d1e")));
    }

    #[test]
    fn test_parse_empty_output() {
        assert_eq!(parse_ls_remote(""), None);
        assert_eq!(parse_ls_remote("  \n"), None);
    }

    #[tokio::test]
    async fn test_probe_missing_repository_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ConfigLocator::split(&format!(
            "{}#main",
            dir.path().join("nope").display()
        ));
        assert_eq!(GitRefProbe::new().probe(&locator).await, None);
    }
}
