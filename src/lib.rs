//! Devtools bridge SDK for a native health-data platform.
//!
//! This library connects out-of-process tooling (CLI, REPL, batch
//! importer) to the health-data plugin running inside an application,
//! over a shared devtools WebSocket multiplexer.
//!
//! # Architecture
//!
//! The bridge has two symmetric halves:
//!
//! - **Client**: dials the devtools endpoint, registers the `healthkit`
//!   channel with a handshake, and issues correlation-tagged requests
//!   with per-request timeouts.
//! - **Handler**: runs inside the app host, dispatches each request to
//!   the native platform (an external collaborator behind a trait), and
//!   answers with exactly one result or error envelope.
//!
//! Human-friendly time expressions (`today 8am`, `-1d`, `1h30m`) are
//! resolved by the relative-date engine before they cross into the
//! protocol layer.
//!
//! # Quick Start
//!
//! ```no_run
//! use healthkit_devtools::{HealthClient, QueryOptions, Result, reldate};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HealthClient::new("ws://127.0.0.1:8097");
//!     client.connect().await?;
//!
//!     let window = reldate::day_range("yesterday", chrono::Local::now())?;
//!     let options = QueryOptions::new()
//!         .with_start_date(window.start)
//!         .with_end_date(window.end);
//!
//!     let samples = client.query_quantity_samples("heartRate", options).await?;
//!     println!("{samples}");
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | NDJSON batch import |
//! | [`client`] | Typed operation surface over the transport |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`handler`] | In-app dispatch counterpart and endpoint |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`reldate`] | Relative date and duration parsing |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// NDJSON batch import.
pub mod batch;

/// Typed operation surface over the devtools transport.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// In-app message handler and endpoint.
pub mod handler;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Devtools wire protocol message types.
pub mod protocol;

/// Relative date and duration parsing.
pub mod reldate;

/// Devtools WebSocket transport layer.
///
/// Internal module handling the connection event loop and correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::HealthClient;

// Error types
pub use error::{Error, Result};

// Handler types
pub use handler::{DevtoolsEndpoint, HealthPlatform, MessageHandler};

// Identifier types
pub use identifiers::{RequestId, SubscriptionId};

// Protocol types
pub use protocol::{
    Aggregation, CollectionOptions, Interval, Operation, QueryOptions, RequestEnvelope,
    ResponseEnvelope,
};

// Batch types
pub use batch::{ImportRecord, ImportSummary};
