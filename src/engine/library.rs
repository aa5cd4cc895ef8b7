//! Default sync library.
//!
//! # Responsibilities
//! - Own the configuration store and expose it through [`SyncLibrary`]
//! - Expand and filter component selections
//! - Match tagging messages against the configured triggers
//! - Hand individual components to a [`Synchronizer`]
//!
//! # Configuration keys read
//! ```text
//! [trigger]
//! rpms = "<tag>"        # tag whose builds trigger rpm syncs
//! modules = "<tag>"     # tag whose builds trigger module syncs
//!
//! [control]
//! strict = true         # only sync configured components (default)
//! exclude = { rpms = ["<name>"], modules = ["<name>:<stream>"] }
//!
//! [components.rpms.<name>]              # one table per configured component
//! [components.modules."<name>:<stream>"]
//! ```
//!
//! The same exclusion and strict-mode rules apply to selections and to
//! tagging messages.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::bus::Message;
use crate::config::locator::ConfigLocator;
use crate::config::settings::Policy;
use crate::config::store::{ConfigSnapshot, ConfigStore, StoreError};
use crate::engine::component::{Component, Namespace, Selection};
use crate::engine::sync::{SyncRequest, Synchronizer};
use crate::engine::SyncLibrary;

/// Topic suffix of build tagging events.
pub const TAG_TOPIC_SUFFIX: &str = "buildsys.tag";

#[derive(Debug, Deserialize)]
struct TagEvent {
    name: String,
    version: String,
    release: String,
    tag: String,
}

/// The `[control]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Control {
    strict: bool,
    exclude: Exclude,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            strict: true,
            exclude: Exclude::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Exclude {
    rpms: BTreeSet<String>,
    modules: BTreeSet<String>,
}

impl Control {
    fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        let Some(table) = snapshot.document.get("control") else {
            return Self::default();
        };
        match table.clone().try_into() {
            Ok(control) => control,
            Err(e) => {
                tracing::error!(error = %e, "Invalid [control] table, falling back to strict mode");
                Self::default()
            }
        }
    }

    fn excluded(&self, component: &Component) -> bool {
        let names = match component.namespace {
            Namespace::Rpms => &self.exclude.rpms,
            Namespace::Modules => &self.exclude.modules,
        };
        names.contains(&component.name)
    }

    /// Whether `component` may be synchronized.
    fn admits(&self, snapshot: &ConfigSnapshot, component: &Component) -> bool {
        if self.excluded(component) {
            tracing::info!(component = %component, "Component is excluded from sync, skipping");
            return false;
        }
        if self.strict && !configured(snapshot, component.namespace).contains(&component.name) {
            tracing::info!(
                component = %component,
                "Component not configured while the strict mode is enabled, skipping"
            );
            return false;
        }
        true
    }
}

/// Counters for one pass over a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Components handed to the synchronizer, failed ones included.
    pub processed: usize,
    /// Handed over but reported an error.
    pub failed: usize,
    /// Garbage, excluded or (in strict mode) unconfigured tokens.
    pub skipped: usize,
}

/// [`SyncLibrary`] backed by a [`ConfigStore`].
pub struct Library {
    store: Arc<ConfigStore>,
    synchronizer: Arc<dyn Synchronizer>,
}

impl Library {
    pub fn new(store: Arc<ConfigStore>, synchronizer: Arc<dyn Synchronizer>) -> Self {
        Self {
            store,
            synchronizer,
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    fn snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        let snapshot = self.store.current();
        if snapshot.is_none() {
            tracing::error!(critical = true, "DistroBaker is not configured, aborting");
        }
        snapshot
    }

    /// Synchronize every admitted component of `selection` in order.
    ///
    /// Returns `None` when no configuration is loaded. A component whose
    /// sync fails is counted and the walk goes on.
    pub async fn run_components(&self, selection: &Selection, policy: &Policy) -> Option<RunSummary> {
        let snapshot = self.snapshot()?;
        let control = Control::from_snapshot(&snapshot);
        if control.strict {
            tracing::info!("Running in the strict mode, only configured components will be processed");
        } else {
            tracing::info!("Running in the non-strict mode, all selected components will be processed");
        }

        let selection = if selection.is_empty() {
            tracing::debug!("No components selected, gathering configured components");
            Namespace::ALL
                .into_iter()
                .flat_map(|ns| {
                    configured(&snapshot, ns)
                        .into_iter()
                        .map(move |name| format!("{ns}/{name}"))
                })
                .collect()
        } else {
            selection.clone()
        };
        tracing::info!(count = selection.len(), "Processing components");

        let mut summary = RunSummary::default();
        for token in selection.ordered() {
            let component: Component = match token.parse() {
                Ok(component) => component,
                Err(e) => {
                    tracing::error!("{}", e);
                    summary.skipped += 1;
                    continue;
                }
            };
            if !control.admits(&snapshot, &component) {
                summary.skipped += 1;
                continue;
            }

            tracing::info!(component = %component, "Processing component");
            let request = SyncRequest {
                component,
                nvr: None,
            };
            if let Err(e) = self.synchronizer.sync(&request, policy).await {
                tracing::error!(error = %e, "Component failed");
                summary.failed += 1;
            }
            summary.processed += 1;
        }

        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            "Component processing finished"
        );
        Some(summary)
    }
}

fn configured(snapshot: &ConfigSnapshot, namespace: Namespace) -> BTreeSet<String> {
    snapshot
        .document
        .get("components")
        .and_then(|c| c.get(namespace.as_str()))
        .and_then(|t| t.as_table())
        .map(|t| t.keys().cloned().collect())
        .unwrap_or_default()
}

fn trigger_namespace(snapshot: &ConfigSnapshot, tag: &str) -> Option<Namespace> {
    let triggers = snapshot.document.get("trigger")?;
    Namespace::ALL
        .into_iter()
        .find(|ns| triggers.get(ns.as_str()).and_then(|v| v.as_str()) == Some(tag))
}

/// Component name a tagging event refers to.
///
/// Module builds carry their stream in `version`, with dashes mangled to
/// underscores, so `name:version` is matched against configured
/// `name:stream` keys modulo that mangling. The exact stream of an
/// unconfigured module is left for the synchronizer to resolve.
fn event_component(snapshot: &ConfigSnapshot, namespace: Namespace, event: &TagEvent) -> String {
    match namespace {
        Namespace::Rpms => event.name.clone(),
        Namespace::Modules => {
            let mangled = format!("{}:{}", event.name, event.version).replace('-', "_");
            configured(snapshot, namespace)
                .into_iter()
                .find(|key| key.replace('-', "_") == mangled)
                .unwrap_or_else(|| format!("{}:{}", event.name, event.version))
        }
    }
}

#[async_trait]
impl SyncLibrary for Library {
    async fn load_config(&self, locator: &ConfigLocator, policy: &Policy) -> Result<(), StoreError> {
        self.store.load(locator, policy).await.map(|_| ())
    }

    async fn process_components(&self, selection: &Selection, policy: &Policy) {
        self.run_components(selection, policy).await;
    }

    async fn process_message(&self, message: &Message, policy: &Policy) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };

        if !message.topic.ends_with(TAG_TOPIC_SUFFIX) {
            tracing::warn!(topic = %message.topic, "Unable to handle topic, ignoring");
            return;
        }

        let event: TagEvent = match serde_json::from_value(message.body.clone()) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to process the tagging message");
                return;
            }
        };
        let nvr = format!("{}-{}-{}", event.name, event.version, event.release);
        tracing::debug!(component = %event.name, tag = %event.tag, "Tagging event received");

        let Some(namespace) = trigger_namespace(&snapshot, &event.tag) else {
            tracing::debug!(tag = %event.tag, "Tag not configured as a trigger, ignoring");
            return;
        };

        let component = Component::new(namespace, event_component(&snapshot, namespace, &event));
        if !Control::from_snapshot(&snapshot).admits(&snapshot, &component) {
            return;
        }

        let request = SyncRequest {
            component,
            nvr: Some(nvr),
        };
        tracing::info!(component = %request.component, tag = %event.tag, "Handling trigger");
        match self.synchronizer.sync(&request, policy).await {
            Ok(()) => tracing::info!(component = %request.component, "Trigger processed"),
            Err(e) => tracing::error!(error = %e, "Trigger aborted"),
        }
    }
}
