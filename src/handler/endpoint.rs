//! Devtools endpoint serving the in-app handler.
//!
//! The app host binds this endpoint and serves connected clients: the
//! first frame on a connection must be the channel handshake, after which
//! message frames are dispatched and answered. Frames that are not JSON,
//! or that belong to another channel, are ignored.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, from_str, to_string};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::PLUGIN_NAME;

use super::{HealthPlatform, MessageHandler};

// ============================================================================
// DevtoolsEndpoint
// ============================================================================

/// A bound devtools endpoint awaiting client connections.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use healthkit_devtools::handler::{DevtoolsEndpoint, MessageHandler};
///
/// let endpoint = DevtoolsEndpoint::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// let url = endpoint.ws_url();
/// let handler = MessageHandler::new(platform);
/// endpoint.serve(handler).await?;
/// ```
pub struct DevtoolsEndpoint {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the endpoint is bound to.
    port: u16,
}

impl DevtoolsEndpoint {
    /// Binds the endpoint to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "Devtools endpoint bound");

        Ok(Self {
            listener,
            port: actual_port,
        })
    }

    /// Returns the port the endpoint is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this endpoint.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Serves clients until the listener fails.
    ///
    /// Each accepted connection runs on its own task against a clone of
    /// the handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if accepting fails.
    pub async fn serve<P: HealthPlatform + 'static>(
        self,
        handler: MessageHandler<P>,
    ) -> Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!(?addr, "Client connected");

            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, handler).await {
                    warn!(error = %e, "Client connection ended with error");
                }
            });
        }
    }

    /// Accepts and serves exactly one connection, then returns.
    ///
    /// Convenience for hosts (and tests) that expect a single client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on accept failure or [`Error::Connection`]
    /// if the WebSocket upgrade fails.
    pub async fn serve_one<P: HealthPlatform>(self, handler: MessageHandler<P>) -> Result<()> {
        let (stream, addr) = self.listener.accept().await?;
        debug!(?addr, "Client connected");
        serve_connection(stream, handler).await
    }
}

// ============================================================================
// Connection loop
// ============================================================================

/// Serves one client connection until it closes.
async fn serve_connection<P: HealthPlatform>(
    stream: TcpStream,
    handler: MessageHandler<P>,
) -> Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

    let (mut ws_write, mut ws_read) = ws_stream.split();

    while let Some(message) = ws_read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handle_frame(&handler, text.as_str()).await {
                    ws_write.send(Message::Text(reply.into())).await?;
                }
            }

            Ok(Message::Close(_)) => {
                debug!("Client closed connection");
                break;
            }

            Err(e) => return Err(e.into()),

            // Ignore Binary, Ping, Pong
            _ => {}
        }
    }

    Ok(())
}

/// Routes one inbound text frame; returns the serialized reply, if any.
///
/// Non-JSON frames and frames for other channels are dropped.
async fn handle_frame<P: HealthPlatform>(
    handler: &MessageHandler<P>,
    text: &str,
) -> Option<String> {
    let Ok(frame) = from_str::<Value>(text) else {
        trace!("Ignoring non-JSON frame");
        return None;
    };

    match frame.get("type").and_then(Value::as_str) {
        Some("handshake") => {
            let plugin = frame
                .get("pluginName")
                .and_then(Value::as_str)
                .unwrap_or_default();
            info!(plugin, "Channel registered");
            None
        }

        Some("message") => {
            if frame.get("pluginName").and_then(Value::as_str) != Some(PLUGIN_NAME) {
                trace!("Ignoring frame for another channel");
                return None;
            }

            let data = frame.get("data")?;
            let response = handler.handle_wire(data).await?;
            to_string(&response).ok()
        }

        _ => {
            trace!("Ignoring unrecognized frame");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::client::HealthClient;
    use crate::identifiers::SubscriptionId;
    use crate::protocol::{Aggregation, CollectionOptions, QueryOptions};

    /// Minimal platform for end-to-end tests.
    struct LoopbackPlatform;

    #[async_trait]
    impl HealthPlatform for LoopbackPlatform {
        async fn query_quantity_samples(
            &self,
            sample_type: String,
            _options: QueryOptions,
        ) -> Result<Value> {
            Ok(json!({ "type": sample_type, "samples": [{ "value": 72.0 }] }))
        }

        async fn query_category_samples(
            &self,
            _sample_type: String,
            _options: QueryOptions,
        ) -> Result<Value> {
            Ok(json!({ "samples": [] }))
        }

        async fn query_workouts(&self, _options: QueryOptions) -> Result<Value> {
            Ok(json!({ "workouts": [] }))
        }

        async fn query_statistics(
            &self,
            _sample_type: String,
            _aggregations: Vec<Aggregation>,
            _options: QueryOptions,
        ) -> Result<Value> {
            Ok(json!({}))
        }

        async fn query_statistics_collection(
            &self,
            _sample_type: String,
            _aggregations: Vec<Aggregation>,
            _options: CollectionOptions,
        ) -> Result<Value> {
            Ok(json!({}))
        }

        async fn query_activity_summary(
            &self,
            _start_date: String,
            _end_date: String,
        ) -> Result<Value> {
            Ok(json!({ "summaries": [] }))
        }

        async fn save_quantity_sample(
            &self,
            sample_type: String,
            _value: f64,
            unit: String,
            _start_date: String,
            _end_date: String,
            _metadata: Option<Value>,
        ) -> Result<Value> {
            if unit == "?" {
                return Err(Error::remote(format!("No unit for {sample_type}")));
            }
            Ok(json!({ "success": true }))
        }

        async fn save_category_sample(
            &self,
            _sample_type: String,
            _value: i64,
            _start_date: String,
            _end_date: String,
            _metadata: Option<Value>,
        ) -> Result<Value> {
            Ok(json!({ "success": true }))
        }

        async fn save_workout(
            &self,
            _activity_type: String,
            _start_date: String,
            _end_date: String,
            _energy: Option<f64>,
            _distance: Option<f64>,
            _metadata: Option<Value>,
        ) -> Result<Value> {
            Ok(json!({ "success": true }))
        }

        async fn delete_samples(
            &self,
            _sample_type: String,
            _start_date: String,
            _end_date: String,
        ) -> Result<Value> {
            Ok(json!({ "deleted": 0 }))
        }

        async fn authorization_status(&self, _types: Vec<String>) -> Result<Value> {
            Ok(json!({}))
        }

        async fn request_authorization(
            &self,
            _read: Vec<String>,
            _write: Vec<String>,
        ) -> Result<Value> {
            Ok(json!({ "granted": true }))
        }

        async fn date_of_birth(&self) -> Result<Value> {
            Ok(json!("1990-04-01"))
        }

        async fn biological_sex(&self) -> Result<Value> {
            Ok(json!("female"))
        }

        async fn blood_type(&self) -> Result<Value> {
            Ok(json!("O-"))
        }

        async fn wheelchair_use(&self) -> Result<Value> {
            Ok(json!(false))
        }

        async fn status(&self) -> Result<Value> {
            Ok(json!({ "available": true, "authorized": true }))
        }

        async fn subscribe(&self, _sample_type: String) -> Result<SubscriptionId> {
            Ok(SubscriptionId::new("sub-e2e"))
        }

        async fn unsubscribe(&self, _subscription_id: SubscriptionId) -> Result<()> {
            Ok(())
        }
    }

    /// Binds an endpoint, serves one connection in the background, and
    /// returns a connected client.
    async fn connected_pair() -> HealthClient {
        let endpoint = DevtoolsEndpoint::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind");
        let url = endpoint.ws_url();

        tokio::spawn(async move {
            let handler = MessageHandler::new(LoopbackPlatform);
            let _ = endpoint.serve_one(handler).await;
        });

        let client = HealthClient::new(url);
        client.connect().await.expect("connect");
        client
    }

    #[tokio::test]
    async fn test_bind_random_port() {
        let endpoint = DevtoolsEndpoint::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind");

        assert!(endpoint.port() > 0);
        assert!(endpoint.ws_url().starts_with("ws://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_end_to_end_save_quantity_sample() {
        let client = connected_pair().await;

        let data = client
            .save_quantity_sample(
                "heartRate",
                72.0,
                "count/min",
                "2026-01-04T08:00:00.000Z",
                Some("2026-01-04T08:00:00.000Z".to_string()),
                None,
            )
            .await
            .expect("save");

        assert_eq!(data["success"], true);
        client.disconnect();
    }

    #[tokio::test]
    async fn test_end_to_end_remote_error_passthrough() {
        let client = connected_pair().await;

        let err = client
            .save_quantity_sample("X", 1.0, "?", "2026-01-04T08:00:00.000Z", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No unit for X");
        client.disconnect();
    }

    #[tokio::test]
    async fn test_end_to_end_connect_is_idempotent() {
        let client = connected_pair().await;

        // Second connect is a no-op on a live connection
        client.connect().await.expect("reconnect");

        let status = client.get_status().await.expect("status");
        assert_eq!(status["available"], true);
        client.disconnect();
    }

    #[tokio::test]
    async fn test_end_to_end_characteristics() {
        let client = connected_pair().await;

        let data = client.get_characteristics().await.expect("characteristics");
        assert_eq!(data["dateOfBirth"], "1990-04-01");
        assert_eq!(data["bloodType"], "O-");
        client.disconnect();
    }

    #[tokio::test]
    async fn test_end_to_end_subscribe_unsubscribe() {
        let client = connected_pair().await;

        let data = client.subscribe_to_changes("heartRate").await.expect("subscribe");
        assert_eq!(data["subscriptionId"], "sub-e2e");

        let data = client
            .unsubscribe(SubscriptionId::new("sub-e2e"))
            .await
            .expect("unsubscribe");
        assert_eq!(data["success"], true);
        client.disconnect();
    }
}
