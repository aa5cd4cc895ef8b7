//! Remote configuration watcher for hot reload.
//!
//! Polls the configuration ref on a fixed period and reloads the
//! configuration through the sync library whenever the ref moves.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::config::locator::ConfigLocator;
use crate::config::probe::{RefProbe, ResolvedRef};
use crate::config::settings::Policy;
use crate::engine::SyncLibrary;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;

/// Shortest accepted polling period.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The remote could not be queried.
    Unavailable,
    /// The ref still points at the last known commit.
    Unchanged,
    /// The ref moved and the new configuration was loaded.
    Reloaded(ResolvedRef),
    /// The ref moved but the new configuration failed to load.
    ReloadFailed(ResolvedRef),
}

/// Periodically checks the configuration ref and reloads on change.
pub struct ConfigWatcher {
    locator: ConfigLocator,
    probe: Arc<dyn RefProbe>,
    library: Arc<dyn SyncLibrary>,
    policy: Policy,
    interval: Duration,
    last_known: ResolvedRef,
}

impl ConfigWatcher {
    /// Create a watcher starting from the ref resolved at startup.
    ///
    /// `interval` is raised to [`MIN_INTERVAL`] if shorter.
    pub fn new(
        locator: ConfigLocator,
        initial: ResolvedRef,
        probe: Arc<dyn RefProbe>,
        library: Arc<dyn SyncLibrary>,
        policy: Policy,
        interval: Duration,
    ) -> Self {
        Self {
            locator,
            probe,
            library,
            policy,
            interval: interval.max(MIN_INTERVAL),
            last_known: initial,
        }
    }

    /// The ref the current configuration was (last attempted to be) loaded from.
    pub fn last_known(&self) -> &ResolvedRef {
        &self.last_known
    }

    /// Probe once and reload if the ref moved.
    ///
    /// The last known ref is replaced on any detected change, whether the
    /// reload succeeded or not, so a broken configuration is not retried
    /// until the ref moves again.
    pub async fn check(&mut self) -> CheckOutcome {
        let Some(current) = self.probe.probe(&self.locator).await else {
            tracing::warn!(locator = %self.locator, "Could not resolve configuration ref, will retry");
            metrics::record_ref_probe("unavailable");
            return CheckOutcome::Unavailable;
        };

        if current == self.last_known {
            tracing::debug!(config_ref = %current, "Configuration ref unchanged");
            metrics::record_ref_probe("unchanged");
            return CheckOutcome::Unchanged;
        }

        metrics::record_ref_probe("changed");
        tracing::info!(
            previous = %self.last_known,
            current = %current,
            "Configuration ref changed, reloading"
        );

        let loaded = self.library.load_config(&self.locator, &self.policy).await;
        self.last_known = current.clone();

        match loaded {
            Ok(()) => {
                metrics::record_config_load(true);
                tracing::info!(config_ref = %current, "Configuration reloaded");
                CheckOutcome::Reloaded(current)
            }
            Err(e) => {
                metrics::record_config_load(false);
                tracing::error!(
                    config_ref = %current,
                    error = %e,
                    "Configuration reload failed, keeping the previous configuration"
                );
                CheckOutcome::ReloadFailed(current)
            }
        }
    }

    /// Run the polling loop until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: ShutdownListener) {
        tracing::info!(
            locator = %self.locator,
            interval_secs = self.interval.as_secs(),
            "Config watcher started"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }
            // an in-flight check is abandoned on shutdown
            tokio::select! {
                _ = self.check() => {}
                _ = shutdown.recv() => break,
            }
        }
        tracing::info!("Config watcher received shutdown signal, exiting loop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Message;
    use crate::config::store::StoreError;
    use crate::engine::Selection;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedProbe {
        results: Mutex<VecDeque<Option<&'static str>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(results: &[Option<&'static str>]) -> Self {
            Self {
                results: Mutex::new(results.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RefProbe for ScriptedProbe {
        async fn probe(&self, _: &ConfigLocator) -> Option<ResolvedRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .map(ResolvedRef::new)
        }
    }

    struct CountingLibrary {
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SyncLibrary for CountingLibrary {
        async fn load_config(&self, _: &ConfigLocator, _: &Policy) -> Result<(), StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Missing("distrobaker.toml".into()))
            } else {
                Ok(())
            }
        }

        async fn process_components(&self, _: &Selection, _: &Policy) {}

        async fn process_message(&self, _: &Message, _: &Policy) {}
    }

    fn watcher(
        probe: Arc<ScriptedProbe>,
        library: Arc<CountingLibrary>,
    ) -> ConfigWatcher {
        ConfigWatcher::new(
            ConfigLocator::split("conf#main"),
            ResolvedRef::new("r0"),
            probe,
            library,
            Policy::default(),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_reload_only_on_change() {
        let probe = Arc::new(ScriptedProbe::new(&[None, Some("r0"), Some("r1")]));
        let library = Arc::new(CountingLibrary {
            loads: AtomicUsize::new(0),
            fail: false,
        });
        let mut w = watcher(probe, library.clone());

        assert_eq!(w.check().await, CheckOutcome::Unavailable);
        assert_eq!(w.last_known(), &ResolvedRef::new("r0"));
        assert_eq!(w.check().await, CheckOutcome::Unchanged);
        assert_eq!(library.loads.load(Ordering::SeqCst), 0);

        assert_eq!(w.check().await, CheckOutcome::Reloaded(ResolvedRef::new("r1")));
        assert_eq!(library.loads.load(Ordering::SeqCst), 1);
        assert_eq!(w.last_known(), &ResolvedRef::new("r1"));
    }

    #[tokio::test]
    async fn test_failed_reload_adopts_ref() {
        let probe = Arc::new(ScriptedProbe::new(&[Some("r1"), Some("r1"), Some("r2")]));
        let library = Arc::new(CountingLibrary {
            loads: AtomicUsize::new(0),
            fail: true,
        });
        let mut w = watcher(probe, library.clone());

        assert_eq!(w.check().await, CheckOutcome::ReloadFailed(ResolvedRef::new("r1")));
        assert_eq!(w.last_known(), &ResolvedRef::new("r1"));

        // same bad ref is not retried
        assert_eq!(w.check().await, CheckOutcome::Unchanged);
        assert_eq!(library.loads.load(Ordering::SeqCst), 1);

        assert_eq!(w.check().await, CheckOutcome::ReloadFailed(ResolvedRef::new("r2")));
        assert_eq!(library.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_once_per_interval() {
        let probe = Arc::new(ScriptedProbe::new(&[None, Some("r0"), Some("r1")]));
        let library = Arc::new(CountingLibrary {
            loads: AtomicUsize::new(0),
            fail: false,
        });
        let shutdown = crate::lifecycle::Shutdown::new();
        let handle = tokio::spawn(watcher(probe.clone(), library.clone()).run(shutdown.subscribe()));

        // nothing before the first full interval
        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert_eq!(library.loads.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
        assert_eq!(library.loads.load(Ordering::SeqCst), 1);

        shutdown.trigger();
        handle.await.unwrap();
    }

    /// Answers once, then never again.
    struct StalledProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RefProbe for StalledProbe {
        async fn probe(&self, _: &ConfigLocator) -> Option<ResolvedRef> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Some(ResolvedRef::new("r0"));
            }
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_stalled_check() {
        let probe = Arc::new(StalledProbe {
            calls: AtomicUsize::new(1),
        });
        let library = Arc::new(CountingLibrary {
            loads: AtomicUsize::new(0),
            fail: false,
        });
        let shutdown = crate::lifecycle::Shutdown::new();
        let w = ConfigWatcher::new(
            ConfigLocator::split("conf#main"),
            ResolvedRef::new("r0"),
            probe.clone(),
            library,
            Policy::default(),
            Duration::from_secs(60),
        );
        let handle = tokio::spawn(w.run(shutdown.subscribe()));

        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);

        shutdown.trigger();
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher stuck in a stalled check")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised() {
        let probe = Arc::new(ScriptedProbe::new(&[Some("r0"); 8]));
        let library = Arc::new(CountingLibrary {
            loads: AtomicUsize::new(0),
            fail: false,
        });
        let w = ConfigWatcher::new(
            ConfigLocator::split("conf#main"),
            ResolvedRef::new("r0"),
            probe.clone(),
            library,
            Policy::default(),
            Duration::ZERO,
        );
        assert_eq!(w.interval, MIN_INTERVAL);

        let shutdown = crate::lifecycle::Shutdown::new();
        let handle = tokio::spawn(w.run(shutdown.subscribe()));

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
