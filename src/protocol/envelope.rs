//! Wire envelopes for the devtools channel.
//!
//! The devtools transport is a shared multiplexer; outbound frames carry a
//! plugin name so the in-app router can deliver them to the right handler.
//!
//! # Format
//!
//! Handshake (sent once, immediately after the transport opens):
//! ```json
//! { "type": "handshake", "pluginName": "healthkit" }
//! ```
//!
//! Request:
//! ```json
//! { "type": "message", "pluginName": "healthkit",
//!   "data": { "id": "uuid", "type": "saveQuantitySample", "payload": { ... } } }
//! ```
//!
//! Response (not wrapped in a channel envelope):
//! ```json
//! { "id": "uuid", "type": "result", "data": { ... } }
//! { "id": "uuid", "type": "error", "error": "message" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Operation;

// ============================================================================
// Constants
// ============================================================================

/// Channel name registered with the devtools multiplexer.
pub const PLUGIN_NAME: &str = "healthkit";

/// Error message used when an error response carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// ============================================================================
// ClientFrame
// ============================================================================

/// Outbound transport-level frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// One-time channel registration.
    Handshake {
        /// Channel name for routing inside the multiplexer.
        #[serde(rename = "pluginName")]
        plugin_name: String,
    },

    /// A correlation-tagged request.
    Message {
        /// Channel name for routing inside the multiplexer.
        #[serde(rename = "pluginName")]
        plugin_name: String,
        /// The request envelope.
        data: RequestEnvelope,
    },
}

impl ClientFrame {
    /// Creates the handshake frame for this client's channel.
    #[inline]
    #[must_use]
    pub fn handshake() -> Self {
        Self::Handshake {
            plugin_name: PLUGIN_NAME.to_string(),
        }
    }

    /// Wraps a request envelope in a routed message frame.
    #[inline]
    #[must_use]
    pub fn message(data: RequestEnvelope) -> Self {
        Self::Message {
            plugin_name: PLUGIN_NAME.to_string(),
            data,
        }
    }
}

// ============================================================================
// RequestEnvelope
// ============================================================================

/// A correlation-tagged operation request.
///
/// Wire form: `{ "id": "uuid", "type": "<operation>", "payload": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// The operation and its payload.
    #[serde(flatten)]
    pub operation: Operation,
}

impl RequestEnvelope {
    /// Creates an envelope with a fresh request ID.
    #[inline]
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            id: RequestId::generate(),
            operation,
        }
    }
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// A correlation-tagged response from the in-app handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Response kind discriminator.
    #[serde(rename = "type")]
    pub kind: ResponseKind,

    /// Result data (if result).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Creates a result response.
    #[inline]
    #[must_use]
    pub fn result(id: RequestId, data: Value) -> Self {
        Self {
            id,
            kind: ResponseKind::Result,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, message: impl Into<String>) -> Self {
        Self {
            id,
            kind: ResponseKind::Error,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Returns `true` if this is an error response.
    ///
    /// An explicit `error` field marks a failure even when the kind says
    /// result.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error || self.error.is_some()
    }

    /// Extracts the result value, converting error responses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] carrying the handler's message verbatim,
    /// or [`UNKNOWN_ERROR`] when the message is absent.
    pub fn into_result(self) -> Result<Value> {
        if self.is_error() {
            let message = self.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(Error::remote(message));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

// ============================================================================
// ResponseKind
// ============================================================================

/// Response kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Successful response.
    Result,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_frame_shape() {
        let frame = ClientFrame::handshake();
        let json = serde_json::to_value(&frame).expect("serialize");

        assert_eq!(json["type"], "handshake");
        assert_eq!(json["pluginName"], "healthkit");
    }

    #[test]
    fn test_message_frame_shape() {
        let envelope = RequestEnvelope::new(Operation::GetStatus {});
        let id = envelope.id;
        let frame = ClientFrame::message(envelope);

        let json = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(json["type"], "message");
        assert_eq!(json["pluginName"], "healthkit");
        assert_eq!(json["data"]["type"], "getStatus");
        assert_eq!(json["data"]["id"], id.to_string());
    }

    #[test]
    fn test_result_response_parse() {
        let id = RequestId::generate();
        let wire = format!(r#"{{"id":"{id}","type":"result","data":{{"success":true}}}}"#);

        let response: ResponseEnvelope = serde_json::from_str(&wire).expect("parse");
        assert_eq!(response.id, id);
        assert!(!response.is_error());

        let data = response.into_result().expect("result");
        assert_eq!(data["success"], true);
    }

    #[test]
    fn test_error_response_message_verbatim() {
        let id = RequestId::generate();
        let wire = format!(r#"{{"id":"{id}","type":"error","error":"No unit for X"}}"#);

        let response: ResponseEnvelope = serde_json::from_str(&wire).expect("parse");
        assert!(response.is_error());

        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "No unit for X");
    }

    #[test]
    fn test_error_response_without_message() {
        let id = RequestId::generate();
        let wire = format!(r#"{{"id":"{id}","type":"error"}}"#);

        let response: ResponseEnvelope = serde_json::from_str(&wire).expect("parse");
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_error_field_wins_over_result_kind() {
        let id = RequestId::generate();
        let wire = format!(r#"{{"id":"{id}","type":"result","error":"partial failure"}}"#);

        let response: ResponseEnvelope = serde_json::from_str(&wire).expect("parse");
        assert!(response.is_error());
    }

    #[test]
    fn test_request_envelope_flattens_operation() {
        let envelope = RequestEnvelope::new(Operation::SubscribeToChanges {
            sample_type: "heartRate".to_string(),
        });

        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["type"], "subscribeToChanges");
        assert_eq!(json["payload"]["type"], "heartRate");
        assert!(json.get("id").is_some());
    }
}
