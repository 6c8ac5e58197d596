//! Devtools WebSocket transport layer.
//!
//! This module handles communication between the out-of-process client
//! and the in-app message handler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  CLI / importer │                              │  App host       │
//! │                 │         WebSocket            │                 │
//! │  Connection     │◄────────────────────────────►│  Devtools       │
//! │                 │      ws://host:PORT          │  multiplexer    │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Dial the endpoint (5s deadline)
//! 2. Handshake frame registers the `healthkit` channel
//! 3. `Connection::call` - Correlated request/response (30s per call)
//! 4. `Connection::shutdown` - Close the transport explicitly
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
