//! Devtools WebSocket connection and event loop.
//!
//! This module handles the persistent connection to the in-app handler,
//! including the channel handshake and request/response correlation.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the app (responses; unrelated traffic is dropped)
//! - Outgoing requests from the client API
//! - Request/response correlation by UUID
//! - Per-request timeout cleanup

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{ClientFrame, Operation, RequestEnvelope, ResponseEnvelope};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for establishing the transport (5s).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for one request/response round trip (30s).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// The dialed WebSocket stream type.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<ResponseEnvelope>>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for response.
    Send {
        envelope: RequestEnvelope,
        response_tx: oneshot::Sender<Result<ResponseEnvelope>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// One logical link to the in-app handler.
///
/// Handles the channel handshake and request/response correlation.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and can be shared across tasks.
/// All operations are non-blocking; any number of calls may be in
/// flight concurrently, distinguished solely by request ID.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Cleared when the event loop exits.
    connected: Arc<AtomicBool>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            connected: Arc::clone(&self.connected),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Opens the transport to a devtools endpoint and registers the channel.
    ///
    /// Races the WebSocket open against a 5-second deadline, then sends the
    /// handshake frame before returning, so no call issued afterwards can
    /// race ahead of the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the transport does not open in time
    /// - [`Error::Connection`] if the open fails
    /// - [`Error::WebSocket`] if the handshake send fails
    pub async fn open(url: &str) -> Result<Self> {
        let (mut ws_stream, _) = match timeout(CONNECT_TIMEOUT, connect_async(url)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(Error::connection(e.to_string())),
            Err(_) => return Err(Error::connection_timeout(CONNECT_TIMEOUT.as_millis() as u64)),
        };

        let handshake = to_string(&ClientFrame::handshake())?;
        ws_stream.send(Message::Text(handshake.into())).await?;

        debug!(url, "Devtools channel registered");

        Ok(Self::spawn(ws_stream))
    }

    /// Creates a connection from an already-open WebSocket stream.
    ///
    /// Sends no handshake; used by [`open`](Self::open) and by tests that
    /// drive the stream directly.
    pub(crate) fn spawn(ws_stream: WsStream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&connected),
        ));

        Self {
            command_tx,
            correlation,
            connected,
        }
    }

    /// Returns `true` while the event loop is alive.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Sends an operation and waits for its result with the default
    /// timeout (30s).
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::RequestTimeout`] if no response arrives within the timeout
    /// - [`Error::Remote`] if the handler reports failure
    pub async fn call(&self, operation: Operation) -> Result<Value> {
        self.call_with_timeout(operation, DEFAULT_REQUEST_TIMEOUT)
            .await
    }

    /// Sends an operation and waits for its result with a custom timeout.
    ///
    /// A firing timeout removes the correlation entry and rejects the
    /// caller; the transport itself is left untouched, and a late response
    /// is dropped by the unknown-id path.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub async fn call_with_timeout(
        &self,
        operation: Operation,
        request_timeout: Duration,
    ) -> Result<Value> {
        let envelope = RequestEnvelope::new(operation);
        let request_id = envelope.id;

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                envelope,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        let response = match timeout(request_timeout, response_rx).await {
            // The outer ? maps a dropped sender to ChannelClosed
            Ok(received) => received??,
            Err(_) => {
                // Timeout - clean up the correlation entry
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                return Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ));
            }
        };

        response.into_result()
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Shuts down the connection gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        connected: Arc<AtomicBool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the app
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_frame(&text, &correlation);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("Transport closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "Transport error");
                            break;
                        }

                        None => {
                            debug!("Transport stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { envelope, response_tx }) => {
                            Self::handle_send_command(
                                envelope,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        connected.store(false, Ordering::Release);

        // Fail all pending requests rather than letting them dangle until
        // their own timeouts fire
        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text frame from the app.
    ///
    /// Non-protocol traffic shares the transport, so frames that do not
    /// parse as responses are dropped without comment.
    fn handle_incoming_frame(text: &str, correlation: &Arc<Mutex<CorrelationMap>>) {
        let Ok(response) = from_str::<ResponseEnvelope>(text) else {
            trace!("Ignoring non-protocol frame");
            return;
        };

        let tx = correlation.lock().remove(&response.id);

        if let Some(tx) = tx {
            let _ = tx.send(Ok(response));
        } else {
            // Late response after a timeout, or traffic for another client
            debug!(id = %response.id, "Response for unknown request");
        }
    }

    /// Handles a send command from the client API.
    async fn handle_send_command(
        envelope: RequestEnvelope,
        response_tx: oneshot::Sender<Result<ResponseEnvelope>>,
        ws_write: &mut futures_util::stream::SplitSink<WsStream, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = envelope.id;

        let json = match to_string(&ClientFrame::message(envelope)) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, response_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            // Remove correlation and notify caller
            if let Some(tx) = correlation.lock().remove(&request_id) {
                let _ = tx.send(Err(Error::WebSocket(e)));
            }
            return;
        }

        trace!(%request_id, "Request sent");
    }

    /// Fails all pending requests with ConnectionClosed.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on close");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
