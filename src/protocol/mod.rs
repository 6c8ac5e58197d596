//! Devtools wire protocol message types.
//!
//! This module defines the message format for communication between the
//! out-of-process client (CLI/REPL/batch importer) and the in-app handler.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `ClientFrame::Handshake` | Client → App | Channel registration |
//! | `ClientFrame::Message` | Client → App | Operation request |
//! | `ResponseEnvelope` | App → Client | Operation result or error |
//!
//! Correlation is strictly by request `id`; responses may arrive in any
//! order. Non-JSON frames on the shared transport are ignored.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Transport frames and request/response envelopes |
//! | `operation` | The operation catalogue sum type and payload types |

// ============================================================================
// Submodules
// ============================================================================

/// Transport frames and request/response envelopes.
pub mod envelope;

/// Operation catalogue and payload value types.
pub mod operation;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{
    ClientFrame, PLUGIN_NAME, RequestEnvelope, ResponseEnvelope, ResponseKind, UNKNOWN_ERROR,
};
pub use operation::{Aggregation, CollectionOptions, Interval, Operation, QueryOptions};
