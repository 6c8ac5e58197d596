//! Shared platform fake for cross-module tests.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::{Aggregation, CollectionOptions, QueryOptions};

use super::HealthPlatform;

/// Platform where every operation trivially succeeds.
pub(crate) struct NullPlatform;

#[async_trait]
impl HealthPlatform for NullPlatform {
    async fn query_quantity_samples(
        &self,
        _sample_type: String,
        _options: QueryOptions,
    ) -> Result<Value> {
        Ok(json!({ "samples": [] }))
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
        _sample_type: String,
        _value: f64,
        _unit: String,
        _start_date: String,
        _end_date: String,
        _metadata: Option<Value>,
    ) -> Result<Value> {
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

    async fn request_authorization(&self, _read: Vec<String>, _write: Vec<String>) -> Result<Value> {
        Ok(json!({ "granted": true }))
    }

    async fn date_of_birth(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn biological_sex(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn blood_type(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn wheelchair_use(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn status(&self) -> Result<Value> {
        Ok(json!({ "available": true }))
    }

    async fn subscribe(&self, _sample_type: String) -> Result<SubscriptionId> {
        Ok(SubscriptionId::new("sub-null"))
    }

    async fn unsubscribe(&self, _subscription_id: SubscriptionId) -> Result<()> {
        Ok(())
    }
}
