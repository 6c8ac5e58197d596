//! Typed operation surface over the devtools transport.
//!
//! [`HealthClient`] owns the connection lifecycle explicitly: callers open
//! it with [`connect`](HealthClient::connect), reuse it across calls, and
//! close it with [`disconnect`](HealthClient::disconnect). Each catalogue
//! operation gets a thin wrapper around [`call`](HealthClient::call) with
//! no logic beyond argument shaping.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::{Aggregation, CollectionOptions, Operation, QueryOptions};
use crate::transport::Connection;

// ============================================================================
// HealthClient
// ============================================================================

/// Client for the in-app healthkit devtools handler.
///
/// Holds at most one live connection; [`connect`](Self::connect) is a
/// no-op while connected, and any call without a connection fails
/// immediately with [`Error::NotConnected`] before any frame is sent.
pub struct HealthClient {
    /// Devtools endpoint URL (e.g. `ws://127.0.0.1:8097`).
    endpoint: String,
    /// The live connection, if any.
    connection: Mutex<Option<Connection>>,
}

impl fmt::Debug for HealthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthClient")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl HealthClient {
    /// Creates a client for the given devtools endpoint.
    ///
    /// Does not connect; call [`connect`](Self::connect) first.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connection: Mutex::new(None),
        }
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns `true` if a live connection exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .as_ref()
            .is_some_and(Connection::is_connected)
    }

    /// Opens the connection and registers the channel.
    ///
    /// No-op while already connected. A dead connection left behind by a
    /// transport close is replaced.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the transport does not open within 5s
    /// - [`Error::Connection`] on transport-level failure
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let connection = Connection::open(&self.endpoint).await?;
        debug!(endpoint = %self.endpoint, "Connected");

        *self.connection.lock() = Some(connection);
        Ok(())
    }

    /// Closes the transport, if open, and clears the connection.
    pub fn disconnect(&self) {
        if let Some(connection) = self.connection.lock().take() {
            connection.shutdown();
            debug!(endpoint = %self.endpoint, "Disconnected");
        }
    }

    /// Sends one operation and awaits its result.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without an active connection (no frame sent)
    /// - [`Error::RequestTimeout`] if no response arrives within 30s
    /// - [`Error::Remote`] if the handler reports failure
    pub async fn call(&self, operation: Operation) -> Result<Value> {
        let connection = {
            let guard = self.connection.lock();
            match guard.as_ref() {
                Some(c) if c.is_connected() => c.clone(),
                _ => return Err(Error::NotConnected),
            }
        };

        connection.call(operation).await
    }
}

// ============================================================================
// HealthClient - Queries
// ============================================================================

impl HealthClient {
    /// Queries numeric samples of one quantity type.
    pub async fn query_quantity_samples(
        &self,
        sample_type: impl Into<String>,
        options: QueryOptions,
    ) -> Result<Value> {
        self.call(Operation::QueryQuantitySamples {
            sample_type: sample_type.into(),
            options,
        })
        .await
    }

    /// Queries enumerated-value samples of one category type.
    pub async fn query_category_samples(
        &self,
        sample_type: impl Into<String>,
        options: QueryOptions,
    ) -> Result<Value> {
        self.call(Operation::QueryCategorySamples {
            sample_type: sample_type.into(),
            options,
        })
        .await
    }

    /// Queries workouts.
    pub async fn query_workouts(&self, options: QueryOptions) -> Result<Value> {
        self.call(Operation::QueryWorkouts { options }).await
    }

    /// Aggregates samples over a date range.
    pub async fn query_statistics(
        &self,
        sample_type: impl Into<String>,
        aggregations: Vec<Aggregation>,
        options: QueryOptions,
    ) -> Result<Value> {
        self.call(Operation::QueryStatistics {
            sample_type: sample_type.into(),
            aggregations,
            options,
        })
        .await
    }

    /// Aggregates samples bucketed by a time interval.
    pub async fn query_statistics_collection(
        &self,
        sample_type: impl Into<String>,
        aggregations: Vec<Aggregation>,
        options: CollectionOptions,
    ) -> Result<Value> {
        self.call(Operation::QueryStatisticsCollection {
            sample_type: sample_type.into(),
            aggregations,
            options,
        })
        .await
    }

    /// Queries activity summaries for an inclusive date range.
    pub async fn query_activity_summary(
        &self,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Result<Value> {
        self.call(Operation::QueryActivitySummary {
            start_date: start_date.into(),
            end_date: end_date.into(),
        })
        .await
    }
}

// ============================================================================
// HealthClient - Writes
// ============================================================================

impl HealthClient {
    /// Persists one numeric sample.
    ///
    /// An omitted end date defaults to the start date (instantaneous
    /// sample).
    pub async fn save_quantity_sample(
        &self,
        sample_type: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        start_date: impl Into<String>,
        end_date: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Value> {
        let start_date = start_date.into();
        let end_date = end_date.unwrap_or_else(|| start_date.clone());

        self.call(Operation::SaveQuantitySample {
            sample_type: sample_type.into(),
            value,
            unit: unit.into(),
            start_date,
            end_date,
            metadata,
        })
        .await
    }

    /// Persists one enumerated-value sample.
    ///
    /// An omitted end date defaults to the start date.
    pub async fn save_category_sample(
        &self,
        sample_type: impl Into<String>,
        value: i64,
        start_date: impl Into<String>,
        end_date: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Value> {
        let start_date = start_date.into();
        let end_date = end_date.unwrap_or_else(|| start_date.clone());

        self.call(Operation::SaveCategorySample {
            sample_type: sample_type.into(),
            value,
            start_date,
            end_date,
            metadata,
        })
        .await
    }

    /// Persists one workout.
    pub async fn save_workout(
        &self,
        activity_type: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        energy: Option<f64>,
        distance: Option<f64>,
        metadata: Option<Value>,
    ) -> Result<Value> {
        self.call(Operation::SaveWorkout {
            activity_type: activity_type.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            energy,
            distance,
            metadata,
        })
        .await
    }

    /// Deletes samples of one type within an inclusive date range.
    pub async fn delete_samples(
        &self,
        sample_type: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Result<Value> {
        self.call(Operation::DeleteSamples {
            sample_type: sample_type.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        })
        .await
    }
}

// ============================================================================
// HealthClient - Authorization & Misc
// ============================================================================

impl HealthClient {
    /// Reads the authorization status for a set of types.
    pub async fn get_authorization_status(&self, types: Vec<String>) -> Result<Value> {
        self.call(Operation::GetAuthorizationStatus { types }).await
    }

    /// Prompts for read/write authorization.
    pub async fn request_authorization(
        &self,
        read: Vec<String>,
        write: Vec<String>,
    ) -> Result<Value> {
        self.call(Operation::RequestAuthorization { read, write })
            .await
    }

    /// Fetches static user characteristics.
    pub async fn get_characteristics(&self) -> Result<Value> {
        self.call(Operation::GetCharacteristics {}).await
    }

    /// Fetches platform availability/status.
    pub async fn get_status(&self) -> Result<Value> {
        self.call(Operation::GetStatus {}).await
    }

    /// Subscribes to changes of one sample type.
    pub async fn subscribe_to_changes(&self, sample_type: impl Into<String>) -> Result<Value> {
        self.call(Operation::SubscribeToChanges {
            sample_type: sample_type.into(),
        })
        .await
    }

    /// Cancels a change subscription.
    pub async fn unsubscribe(&self, subscription_id: SubscriptionId) -> Result<Value> {
        self.call(Operation::Unsubscribe { subscription_id }).await
    }
}

// ============================================================================
// Tests
// ============================================================================
