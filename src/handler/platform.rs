//! Native health-data platform seam.
//!
//! The actual storage, querying and authorization logic lives in the
//! native platform; this trait is the only surface the handler touches.
//! The app host provides the real implementation; tests provide
//! in-memory fakes.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::{Aggregation, CollectionOptions, QueryOptions};

// ============================================================================
// HealthPlatform
// ============================================================================

/// Operations the handler dispatches against the native platform.
///
/// Every method maps to exactly one catalogue operation, except the
/// characteristic lookups, which the handler fans out concurrently for
/// `getCharacteristics`.
#[async_trait]
pub trait HealthPlatform: Send + Sync {
    /// Queries numeric samples of one quantity type.
    async fn query_quantity_samples(
        &self,
        sample_type: String,
        options: QueryOptions,
    ) -> Result<Value>;

    /// Queries enumerated-value samples of one category type.
    async fn query_category_samples(
        &self,
        sample_type: String,
        options: QueryOptions,
    ) -> Result<Value>;

    /// Queries workouts.
    async fn query_workouts(&self, options: QueryOptions) -> Result<Value>;

    /// Aggregates samples over a date range.
    async fn query_statistics(
        &self,
        sample_type: String,
        aggregations: Vec<Aggregation>,
        options: QueryOptions,
    ) -> Result<Value>;

    /// Aggregates samples bucketed by a time interval.
    async fn query_statistics_collection(
        &self,
        sample_type: String,
        aggregations: Vec<Aggregation>,
        options: CollectionOptions,
    ) -> Result<Value>;

    /// Queries activity summaries for an inclusive date range.
    async fn query_activity_summary(&self, start_date: String, end_date: String) -> Result<Value>;

    /// Persists one numeric sample.
    async fn save_quantity_sample(
        &self,
        sample_type: String,
        value: f64,
        unit: String,
        start_date: String,
        end_date: String,
        metadata: Option<Value>,
    ) -> Result<Value>;

    /// Persists one enumerated-value sample.
    async fn save_category_sample(
        &self,
        sample_type: String,
        value: i64,
        start_date: String,
        end_date: String,
        metadata: Option<Value>,
    ) -> Result<Value>;

    /// Persists one workout.
    async fn save_workout(
        &self,
        activity_type: String,
        start_date: String,
        end_date: String,
        energy: Option<f64>,
        distance: Option<f64>,
        metadata: Option<Value>,
    ) -> Result<Value>;

    /// Deletes samples of one type within an inclusive date range.
    async fn delete_samples(
        &self,
        sample_type: String,
        start_date: String,
        end_date: String,
    ) -> Result<Value>;

    /// Reads the authorization status for a set of types.
    async fn authorization_status(&self, types: Vec<String>) -> Result<Value>;

    /// Prompts for read/write authorization.
    async fn request_authorization(&self, read: Vec<String>, write: Vec<String>) -> Result<Value>;

    /// Looks up the user's date of birth.
    async fn date_of_birth(&self) -> Result<Value>;

    /// Looks up the user's biological sex.
    async fn biological_sex(&self) -> Result<Value>;

    /// Looks up the user's blood type.
    async fn blood_type(&self) -> Result<Value>;

    /// Looks up the user's wheelchair-use characteristic.
    async fn wheelchair_use(&self) -> Result<Value>;

    /// Reports platform availability/status.
    async fn status(&self) -> Result<Value>;

    /// Registers a change observer for one sample type.
    async fn subscribe(&self, sample_type: String) -> Result<SubscriptionId>;

    /// Cancels a change observer.
    async fn unsubscribe(&self, subscription_id: SubscriptionId) -> Result<()>;
}
