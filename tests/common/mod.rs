//! Shared fakes and fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use distrobaker::bus::{BusError, Message, MessageBus, Subscription};
use distrobaker::config::probe::{RefProbe, ResolvedRef};
use distrobaker::config::settings::Policy;
use distrobaker::config::store::StoreError;
use distrobaker::engine::{Selection, SyncLibrary};
use distrobaker::ConfigLocator;

/// Probe returning a scripted sequence; the last entry repeats forever.
pub struct ScriptedProbe {
    results: Mutex<VecDeque<Option<String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(results: &[Option<&str>]) -> Self {
        Self {
            results: Mutex::new(results.iter().map(|r| r.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefProbe for ScriptedProbe {
    async fn probe(&self, _: &ConfigLocator) -> Option<ResolvedRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.lock().unwrap();
        let next = if results.len() > 1 {
            results.pop_front().flatten()
        } else {
            results.front().cloned().flatten()
        };
        next.map(ResolvedRef::new)
    }
}

/// Probe answering `first` once and never returning afterwards.
pub struct StalledProbe {
    first: String,
    pub calls: AtomicUsize,
}

impl StalledProbe {
    pub fn new(first: &str) -> Self {
        Self {
            first: first.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefProbe for StalledProbe {
    async fn probe(&self, _: &ConfigLocator) -> Option<ResolvedRef> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Some(ResolvedRef::new(self.first.clone()));
        }
        std::future::pending().await
    }
}

/// A call observed by [`RecordingLibrary`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(Policy),
    Components(Selection),
    Message(String),
}

/// Library fake recording every call; load results are scripted.
pub struct RecordingLibrary {
    pub calls: Mutex<Vec<Call>>,
    load_results: Mutex<VecDeque<bool>>,
}

impl RecordingLibrary {
    /// `loads` gives the outcome of each successive load; once exhausted,
    /// loads succeed.
    pub fn new(loads: &[bool]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            load_results: Mutex::new(loads.iter().copied().collect()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count()
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Message(topic) => Some(topic),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SyncLibrary for RecordingLibrary {
    async fn load_config(&self, _: &ConfigLocator, policy: &Policy) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(Call::Load(policy.clone()));
        let ok = self.load_results.lock().unwrap().pop_front().unwrap_or(true);
        if ok {
            Ok(())
        } else {
            Err(StoreError::Missing("distrobaker.toml".into()))
        }
    }

    async fn process_components(&self, selection: &Selection, _: &Policy) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Components(selection.clone()));
    }

    async fn process_message(&self, message: &Message, _: &Policy) {
        tokio::task::yield_now().await;
        self.calls
            .lock()
            .unwrap()
            .push(Call::Message(message.topic.clone()));
    }
}

/// Bus fed by a test-held sender. Dropping the sender disconnects.
pub struct ChannelBus {
    subscription: Mutex<Option<Subscription>>,
}

impl ChannelBus {
    pub fn new() -> (Self, mpsc::Sender<Message>) {
        let (tx, rx) = mpsc::channel(16);
        (
            Self {
                subscription: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl MessageBus for ChannelBus {
    async fn subscribe(&self) -> Result<Subscription, BusError> {
        self.subscription
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BusError::Connect("already subscribed".into()))
    }
}

pub fn message(topic: &str) -> Message {
    Message::new(topic, serde_json::Value::Null)
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A throwaway configuration repository with a `main` branch.
pub struct GitFixture {
    dir: tempfile::TempDir,
}

impl GitFixture {
    pub fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        fixture.git(&["init", "-q"]);
        fixture.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        fixture.git(&["config", "user.name", "DistroBaker Tests"]);
        fixture.git(&["config", "user.email", "tests@example.com"]);
        fixture.git(&["config", "commit.gpgsign", "false"]);
        fixture.commit(config);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `file://` link, so shallow clones work.
    pub fn link(&self) -> String {
        format!("file://{}", self.path().display())
    }

    pub fn locator(&self, reference: &str) -> ConfigLocator {
        ConfigLocator::split(&format!("{}#{}", self.link(), reference))
    }

    pub fn commit(&self, config: &str) {
        std::fs::write(self.path().join("distrobaker.toml"), config).unwrap();
        self.git(&["add", "distrobaker.toml"]);
        self.git(&["commit", "-q", "-m", "update configuration"]);
    }

    pub fn head(&self) -> String {
        let out = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(["rev-parse", "HEAD"])
            .output()
            .unwrap();
        String::from_utf8(out.stdout).unwrap().trim().to_string()
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir()
}
