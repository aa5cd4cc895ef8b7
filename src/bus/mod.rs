//! Message bus subsystem.
//!
//! # Data Flow
//! ```text
//! Bus endpoint
//!     → websocket.rs (connect, decode JSON frames)
//!     → Subscription channel (delivery order preserved)
//!     → consumer.rs (one message at a time)
//!     → SyncLibrary::process_message
//! ```
//!
//! # Design Decisions
//! - Message contents are opaque here; only the engine interprets them
//! - A lost connection ends the subscription; there is no reconnect at
//!   this layer

pub mod consumer;
pub mod websocket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub use consumer::{LoopExit, MessageLoop};
pub use websocket::WebSocketBus;

/// A message delivered by the bus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub topic: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Message {
    pub fn new(topic: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            body,
        }
    }
}

/// Inbound messages for one subscription. Closed when the connection drops.
pub type Subscription = mpsc::Receiver<Message>;

/// Errors opening a subscription.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid bus endpoint {0}: {1}")]
    Endpoint(String, String),

    #[error("bus connection failed: {0}")]
    Connect(String),
}

/// A transport that can deliver messages.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Connect and start receiving messages.
    async fn subscribe(&self) -> Result<Subscription, BusError>;
}
