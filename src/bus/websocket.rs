//! WebSocket bus transport.
//!
//! Each text or binary frame carries one JSON-encoded [`Message`]. Frames
//! that do not decode are logged and dropped; the subscription ends when the
//! server closes the socket or the connection errors out.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as Frame;
use url::Url;

use crate::bus::{BusError, Message, MessageBus, Subscription};

/// Bus client speaking WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketBus {
    endpoint: Url,
    buffer: usize,
}

impl WebSocketBus {
    /// Validate `endpoint` (must be `ws://` or `wss://`).
    pub fn new(endpoint: &str) -> Result<Self, BusError> {
        let url = Url::parse(endpoint)
            .map_err(|e| BusError::Endpoint(endpoint.to_string(), e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self {
                endpoint: url,
                buffer: 64,
            }),
            other => Err(BusError::Endpoint(
                endpoint.to_string(),
                format!("unsupported scheme {other}"),
            )),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MessageBus for WebSocketBus {
    async fn subscribe(&self) -> Result<Subscription, BusError> {
        let (mut stream, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| BusError::Connect(e.to_string()))?;

        tracing::info!(endpoint = %self.endpoint, "Connected to message bus");

        let (tx, rx) = mpsc::channel(self.buffer);
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let decoded = match frame {
                    Ok(Frame::Text(text)) => decode(text.as_bytes()),
                    Ok(Frame::Binary(bytes)) => decode(&bytes),
                    Ok(Frame::Close(reason)) => {
                        tracing::info!(endpoint = %endpoint, ?reason, "Bus closed the connection");
                        break;
                    }
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(endpoint = %endpoint, error = %e, "Bus connection error");
                        break;
                    }
                };

                if let Some(message) = decoded {
                    if tx.send(message).await.is_err() {
                        // consumer gone
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn decode(payload: &[u8]) -> Option<Message> {
    match serde_json::from_slice(payload) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable bus frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_scheme_checked() {
        assert!(WebSocketBus::new("ws://127.0.0.1:9919/bus").is_ok());
        assert!(WebSocketBus::new("wss://bus.example.com").is_ok());
        assert!(WebSocketBus::new("amqp://bus.example.com").is_err());
        assert!(WebSocketBus::new("not a url").is_err());
    }

    #[test]
    fn test_decode() {
        let m = decode(br#"{"topic":"org.example.buildsys.tag","body":{"name":"foo"}}"#).unwrap();
        assert_eq!(m.topic, "org.example.buildsys.tag");
        assert_eq!(m.body["name"], "foo");

        let no_body = decode(br#"{"topic":"t"}"#).unwrap();
        assert!(no_body.body.is_null());

        assert!(decode(b"{").is_none());
    }
}
