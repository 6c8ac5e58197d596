//! Request dispatch against the native platform.
//!
//! Each inbound envelope moves `received → dispatching → (resolved |
//! errored)`: the operation is matched exhaustively and translated into
//! one platform call, which yields exactly one result or one error
//! envelope. There are no partial successes and no retries.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Operation, RequestEnvelope, ResponseEnvelope};

use super::HealthPlatform;

// ============================================================================
// MessageHandler
// ============================================================================

/// In-app counterpart of the devtools client.
///
/// Receives correlation-tagged envelopes, dispatches to the native
/// platform, and returns a result or error envelope per request.
pub struct MessageHandler<P> {
    platform: Arc<P>,
}

impl<P> Clone for MessageHandler<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
        }
    }
}

impl<P: HealthPlatform> MessageHandler<P> {
    /// Creates a handler over a platform implementation.
    #[must_use]
    pub fn new(platform: P) -> Self {
        Self {
            platform: Arc::new(platform),
        }
    }

    /// Handles one untyped wire request.
    ///
    /// The wire is untyped JSON: the correlation id is extracted first so
    /// an error can still be tagged, then the operation is parsed. An
    /// unrecognized `type` yields an error response naming the operation;
    /// a known `type` with a malformed payload yields an error response
    /// carrying the parse failure. Returns `None` only when no id can be
    /// extracted, since an untagged response could never be correlated.
    pub async fn handle_wire(&self, data: &Value) -> Option<ResponseEnvelope> {
        let id: RequestId = serde_json::from_value(data.get("id")?.clone()).ok()?;

        // Re-shape to {type, payload} so stray keys (like id) cannot
        // interfere, and an absent payload reads as empty
        let shaped = json!({
            "type": data.get("type").cloned().unwrap_or(Value::Null),
            "payload": data.get("payload").cloned().unwrap_or_else(|| json!({})),
        });

        match serde_json::from_value::<Operation>(shaped) {
            Ok(operation) => Some(self.handle(RequestEnvelope { id, operation }).await),
            Err(parse_err) => {
                let name = data
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>");

                let error = if Operation::is_known(name) {
                    Error::protocol(format!("Invalid payload for {name}: {parse_err}"))
                } else {
                    Error::unknown_operation(name)
                };

                warn!(operation = name, %error, "Rejected wire request");
                Some(ResponseEnvelope::failure(id, error.to_string()))
            }
        }
    }

    /// Handles one typed request envelope.
    pub async fn handle(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let id = envelope.id;
        let name = envelope.operation.name();
        debug!(%id, operation = name, "Dispatching");

        match self.dispatch(envelope.operation).await {
            Ok(data) => ResponseEnvelope::result(id, data),
            Err(error) => {
                debug!(%id, operation = name, %error, "Operation failed");
                ResponseEnvelope::failure(id, error.to_string())
            }
        }
    }

    /// Translates one operation into platform calls.
    async fn dispatch(&self, operation: Operation) -> Result<Value> {
        let platform = &self.platform;

        match operation {
            Operation::QueryQuantitySamples {
                sample_type,
                options,
            } => platform.query_quantity_samples(sample_type, options).await,

            Operation::QueryCategorySamples {
                sample_type,
                options,
            } => platform.query_category_samples(sample_type, options).await,

            Operation::QueryWorkouts { options } => platform.query_workouts(options).await,

            Operation::QueryStatistics {
                sample_type,
                aggregations,
                options,
            } => {
                platform
                    .query_statistics(sample_type, aggregations, options)
                    .await
            }

            Operation::QueryStatisticsCollection {
                sample_type,
                aggregations,
                options,
            } => {
                platform
                    .query_statistics_collection(sample_type, aggregations, options)
                    .await
            }

            Operation::QueryActivitySummary {
                start_date,
                end_date,
            } => platform.query_activity_summary(start_date, end_date).await,

            Operation::SaveQuantitySample {
                sample_type,
                value,
                unit,
                start_date,
                end_date,
                metadata,
            } => {
                platform
                    .save_quantity_sample(sample_type, value, unit, start_date, end_date, metadata)
                    .await
            }

            Operation::SaveCategorySample {
                sample_type,
                value,
                start_date,
                end_date,
                metadata,
            } => {
                platform
                    .save_category_sample(sample_type, value, start_date, end_date, metadata)
                    .await
            }

            Operation::SaveWorkout {
                activity_type,
                start_date,
                end_date,
                energy,
                distance,
                metadata,
            } => {
                platform
                    .save_workout(activity_type, start_date, end_date, energy, distance, metadata)
                    .await
            }

            Operation::DeleteSamples {
                sample_type,
                start_date,
                end_date,
            } => platform.delete_samples(sample_type, start_date, end_date).await,

            Operation::GetAuthorizationStatus { types } => {
                platform.authorization_status(types).await
            }

            Operation::RequestAuthorization { read, write } => {
                platform.request_authorization(read, write).await
            }

            Operation::GetCharacteristics {} => Ok(self.fetch_characteristics().await),

            Operation::GetStatus {} => platform.status().await,

            Operation::SubscribeToChanges { sample_type } => {
                let subscription_id = platform.subscribe(sample_type).await?;
                Ok(json!({ "subscriptionId": subscription_id }))
            }

            Operation::Unsubscribe { subscription_id } => {
                platform.unsubscribe(subscription_id).await?;
                Ok(json!({ "success": true }))
            }
        }
    }

    /// Fetches the characteristic sub-lookups concurrently.
    ///
    /// Each sub-lookup failure degrades to a `null` field rather than
    /// failing the whole response; this operation never errors.
    async fn fetch_characteristics(&self) -> Value {
        let platform = &self.platform;

        let (date_of_birth, biological_sex, blood_type, wheelchair_use) = tokio::join!(
            platform.date_of_birth(),
            platform.biological_sex(),
            platform.blood_type(),
            platform.wheelchair_use(),
        );

        json!({
            "dateOfBirth": date_of_birth.unwrap_or(Value::Null),
            "biologicalSex": biological_sex.unwrap_or(Value::Null),
            "bloodType": blood_type.unwrap_or(Value::Null),
            "wheelchairUse": wheelchair_use.unwrap_or(Value::Null),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::identifiers::SubscriptionId;
    use crate::protocol::{Aggregation, CollectionOptions, QueryOptions};

    /// Platform fake: saves succeed, characteristics partially fail.
    struct FakePlatform {
        /// When set, every save fails with this message.
        save_error: Option<String>,
    }

    impl FakePlatform {
        fn ok() -> Self {
            Self { save_error: None }
        }

        fn failing_saves(message: &str) -> Self {
            Self {
                save_error: Some(message.to_string()),
            }
        }

        fn save_result(&self) -> Result<Value> {
            match &self.save_error {
                Some(message) => Err(Error::remote(message.clone())),
                None => Ok(json!({ "success": true })),
            }
        }
    }

    #[async_trait]
    impl HealthPlatform for FakePlatform {
        async fn query_quantity_samples(
            &self,
            sample_type: String,
            options: QueryOptions,
        ) -> Result<Value> {
            Ok(json!({ "type": sample_type, "limit": options.limit, "samples": [] }))
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
            aggregations: Vec<Aggregation>,
            _options: QueryOptions,
        ) -> Result<Value> {
            Ok(json!({ "aggregations": aggregations.len() }))
        }

        async fn query_statistics_collection(
            &self,
            _sample_type: String,
            _aggregations: Vec<Aggregation>,
            options: CollectionOptions,
        ) -> Result<Value> {
            Ok(json!({ "interval": options.interval }))
        }

        async fn query_activity_summary(
            &self,
            start_date: String,
            end_date: String,
        ) -> Result<Value> {
            Ok(json!({ "startDate": start_date, "endDate": end_date, "summaries": [] }))
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
            self.save_result()
        }

        async fn save_category_sample(
            &self,
            _sample_type: String,
            _value: i64,
            _start_date: String,
            _end_date: String,
            _metadata: Option<Value>,
        ) -> Result<Value> {
            self.save_result()
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
            self.save_result()
        }

        async fn delete_samples(
            &self,
            _sample_type: String,
            _start_date: String,
            _end_date: String,
        ) -> Result<Value> {
            Ok(json!({ "deleted": 2 }))
        }

        async fn authorization_status(&self, types: Vec<String>) -> Result<Value> {
            Ok(json!(types
                .into_iter()
                .map(|t| (t, "sharingAuthorized"))
                .collect::<std::collections::BTreeMap<_, _>>()))
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
            Err(Error::remote("not authorized"))
        }

        async fn blood_type(&self) -> Result<Value> {
            Ok(json!("A+"))
        }

        async fn wheelchair_use(&self) -> Result<Value> {
            Err(Error::remote("not set"))
        }

        async fn status(&self) -> Result<Value> {
            Ok(json!({ "available": true }))
        }

        async fn subscribe(&self, _sample_type: String) -> Result<SubscriptionId> {
            Ok(SubscriptionId::new("sub-1"))
        }

        async fn unsubscribe(&self, _subscription_id: SubscriptionId) -> Result<()> {
            Ok(())
        }
    }

    fn wire(id: RequestId, operation: &str, payload: Value) -> Value {
        json!({ "id": id, "type": operation, "payload": payload })
    }

    #[tokio::test]
    async fn test_save_quantity_sample_resolves() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        let request = wire(
            id,
            "saveQuantitySample",
            json!({
                "type": "heartRate",
                "value": 72,
                "unit": "count/min",
                "startDate": "2026-01-04T08:00:00.000Z",
                "endDate": "2026-01-04T08:00:00.000Z",
            }),
        );

        let response = handler.handle_wire(&request).await.expect("response");
        assert_eq!(response.id, id);
        assert!(!response.is_error());
        assert_eq!(response.data.expect("data")["success"], true);
    }

    #[tokio::test]
    async fn test_platform_error_passes_through_verbatim() {
        let handler = MessageHandler::new(FakePlatform::failing_saves("No unit for X"));
        let id = RequestId::generate();

        let request = wire(
            id,
            "saveQuantitySample",
            json!({
                "type": "X",
                "value": 1,
                "unit": "?",
                "startDate": "2026-01-04T08:00:00.000Z",
                "endDate": "2026-01-04T08:00:00.000Z",
            }),
        );

        let response = handler.handle_wire(&request).await.expect("response");
        assert!(response.is_error());
        assert_eq!(response.error.as_deref(), Some("No unit for X"));
    }

    #[tokio::test]
    async fn test_unknown_operation_names_the_type() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        let request = wire(id, "queryMoonPhase", json!({}));
        let response = handler.handle_wire(&request).await.expect("response");

        assert!(response.is_error());
        let message = response.error.expect("message");
        assert!(message.contains("queryMoonPhase"), "{message}");
    }

    #[tokio::test]
    async fn test_known_operation_with_bad_payload_is_not_unknown() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        // saveQuantitySample with everything missing
        let request = wire(id, "saveQuantitySample", json!({}));
        let response = handler.handle_wire(&request).await.expect("response");

        assert!(response.is_error());
        let message = response.error.expect("message");
        assert!(message.contains("saveQuantitySample"), "{message}");
        assert!(!message.starts_with("Unknown operation"), "{message}");
    }

    #[tokio::test]
    async fn test_missing_id_yields_no_response() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let request = json!({ "type": "getStatus", "payload": {} });

        assert!(handler.handle_wire(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_payload_reads_as_empty() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        let request = json!({ "id": id, "type": "getStatus" });
        let response = handler.handle_wire(&request).await.expect("response");

        assert!(!response.is_error());
        assert_eq!(response.data.expect("data")["available"], true);
    }

    #[tokio::test]
    async fn test_characteristics_degrade_per_field() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        let request = wire(id, "getCharacteristics", json!({}));
        let response = handler.handle_wire(&request).await.expect("response");

        assert!(!response.is_error());
        let data = response.data.expect("data");
        assert_eq!(data["dateOfBirth"], "1990-04-01");
        assert_eq!(data["bloodType"], "A+");
        // Failed sub-lookups degrade to null, never fail the response
        assert_eq!(data["biologicalSex"], Value::Null);
        assert_eq!(data["wheelchairUse"], Value::Null);
    }

    #[tokio::test]
    async fn test_subscribe_returns_subscription_id() {
        let handler = MessageHandler::new(FakePlatform::ok());
        let id = RequestId::generate();

        let request = wire(id, "subscribeToChanges", json!({ "type": "heartRate" }));
        let response = handler.handle_wire(&request).await.expect("response");

        assert_eq!(response.data.expect("data")["subscriptionId"], "sub-1");
    }
}
