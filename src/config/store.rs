//! Shared configuration store.
//!
//! # Responsibilities
//! - Fetch the configuration repository at a locator's ref
//! - Parse `distrobaker.toml` into an untyped document
//! - Publish the result atomically for concurrent readers
//!
//! # Design Decisions
//! - A failed load never replaces the published snapshot
//! - Loads are serialized; readers never wait on a load in flight
//! - The document is kept untyped, interpretation belongs to the sync engine

use arc_swap::ArcSwapOption;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::git;
use crate::config::locator::ConfigLocator;
use crate::config::settings::Policy;
use crate::resilience::{retry, Backoff};

/// File expected at the root of the configuration repository.
pub const CONFIG_FILE: &str = "distrobaker.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to fetch {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    #[error("configuration repository does not contain {0}")]
    Missing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse distrobaker.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A successfully loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Where the document came from.
    pub locator: ConfigLocator,
    /// Parsed, schema-agnostic document.
    pub document: toml::Table,
    pub loaded_at: SystemTime,
}

/// Holds the current configuration snapshot.
pub struct ConfigStore {
    current: ArcSwapOption<ConfigSnapshot>,
    workdir: PathBuf,
    backoff: Backoff,
    clone_timeout: Duration,
    loading: Mutex<()>,
}

impl ConfigStore {
    /// Create an empty store staging checkouts under `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            workdir: workdir.into(),
            backoff: Backoff::default(),
            clone_timeout: git::CLONE_TIMEOUT,
            loading: Mutex::new(()),
        }
    }

    /// Override the delay schedule between fetch attempts.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Override the limit for a single clone attempt.
    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    /// The published snapshot, if any load has succeeded yet.
    pub fn current(&self) -> Option<Arc<ConfigSnapshot>> {
        self.current.load_full()
    }

    /// Whether any configuration has been loaded.
    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: ConfigSnapshot) -> Arc<ConfigSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(snapshot.clone()));
        snapshot
    }

    /// Fetch, parse and publish the configuration at `locator`.
    pub async fn load(
        &self,
        locator: &ConfigLocator,
        policy: &Policy,
    ) -> Result<Arc<ConfigSnapshot>, StoreError> {
        let _guard = self.loading.lock().await;

        let checkout = self
            .workdir
            .join(format!("distrobaker-{}", uuid::Uuid::new_v4()));
        tracing::info!(
            locator = %locator,
            checkout = %checkout.display(),
            "Fetching configuration"
        );

        let fetched = retry("Configuration fetch", policy.retries, self.backoff, || {
            clone_checkout(locator, &checkout, self.clone_timeout)
        })
        .await;

        let result = match fetched {
            Ok(()) => read_checkout(&checkout).await,
            Err(e) => Err(e),
        };
        remove_checkout(&checkout).await;

        let document = result?;
        let snapshot = self.publish(ConfigSnapshot {
            locator: locator.clone(),
            document,
            loaded_at: SystemTime::now(),
        });
        tracing::debug!(locator = %locator, "Configuration snapshot published");
        Ok(snapshot)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("workdir", &self.workdir)
            .field("configured", &self.is_configured())
            .finish()
    }
}

async fn clone_checkout(
    locator: &ConfigLocator,
    dest: &Path,
    timeout: Duration,
) -> Result<(), StoreError> {
    remove_checkout(dest).await;

    let mut cmd = git::command();
    cmd.arg("clone")
        .arg("--quiet")
        .arg("--depth")
        .arg("1")
        .arg("--single-branch")
        .arg("--branch")
        .arg(locator.ref_or_default())
        .arg(&locator.link)
        .arg(dest);

    let output = match git::output_within(&mut cmd, timeout).await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            return Err(StoreError::Fetch {
                locator: locator.to_string(),
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !output.status.success() {
        return Err(StoreError::Fetch {
            locator: locator.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

async fn read_checkout(dir: &Path) -> Result<toml::Table, StoreError> {
    let path = dir.join(CONFIG_FILE);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::Missing(CONFIG_FILE.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(toml::from_str(&content)?)
}

async fn remove_checkout(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to clean up checkout");
        }
    }
}
