//! In-app message handler (server-side counterpart of the client).
//!
//! The handler receives correlation-tagged request envelopes from the
//! devtools multiplexer, dispatches each to the native health-data
//! platform, and answers with exactly one result or error envelope.
//!
//! # State machine per request
//!
//! ```text
//! received ──► dispatching ──► resolved  { id, type: "result", data }
//!                         └──► errored   { id, type: "error", error }
//! ```
//!
//! An unrecognized operation name is a normal errored outcome, never a
//! crash. The native platform itself is an external collaborator behind
//! the [`HealthPlatform`] trait.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `platform` | The native-platform trait seam |
//! | `dispatch` | Envelope dispatch and response construction |
//! | `endpoint` | WebSocket endpoint serving connected clients |

// ============================================================================
// Submodules
// ============================================================================

/// Native-platform trait seam.
pub mod platform;

/// Envelope dispatch and response construction.
pub mod dispatch;

/// WebSocket endpoint serving connected clients.
pub mod endpoint;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatch::MessageHandler;
pub use endpoint::DevtoolsEndpoint;
pub use platform::HealthPlatform;
