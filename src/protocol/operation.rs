//! Operation catalogue as a tagged sum type.
//!
//! Each devtools request carries one operation; the wire form is
//! `{ "type": "<operationName>", "payload": { ... } }`. Representing the
//! catalogue as an enum makes the handler's dispatch exhaustive at compile
//! time. A genuinely unrecognized wire `type` still surfaces as a runtime
//! unknown-operation error, since the wire itself is untyped JSON.
//!
//! # Operations
//!
//! | Group | Operations |
//! |-------|-----------|
//! | Query | `queryQuantitySamples`, `queryCategorySamples`, `queryWorkouts`, `queryStatistics`, `queryStatisticsCollection`, `queryActivitySummary` |
//! | Write | `saveQuantitySample`, `saveCategorySample`, `saveWorkout`, `deleteSamples` |
//! | Authorization | `getAuthorizationStatus`, `requestAuthorization` |
//! | Misc | `getCharacteristics`, `getStatus`, `subscribeToChanges`, `unsubscribe` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::SubscriptionId;

// ============================================================================
// Operation
// ============================================================================

/// All devtools operations against the native health-data platform.
///
/// Operation names are part of the wire contract; timestamps cross the
/// wire as normalized ISO-8601 strings produced by the relative-date
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Operation {
    /// Query numeric samples of one quantity type.
    QueryQuantitySamples {
        /// Quantity type identifier (e.g. `heartRate`).
        #[serde(rename = "type")]
        sample_type: String,
        /// Date range, limit and sort order.
        #[serde(default)]
        options: QueryOptions,
    },

    /// Query enumerated-value samples of one category type.
    QueryCategorySamples {
        /// Category type identifier (e.g. `sleepAnalysis`).
        #[serde(rename = "type")]
        sample_type: String,
        /// Date range, limit and sort order.
        #[serde(default)]
        options: QueryOptions,
    },

    /// Query workouts.
    QueryWorkouts {
        /// Date range, limit and sort order.
        #[serde(default)]
        options: QueryOptions,
    },

    /// Aggregate samples over a date range.
    QueryStatistics {
        /// Quantity type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Aggregations to compute.
        aggregations: Vec<Aggregation>,
        /// Date range for the aggregation.
        #[serde(default)]
        options: QueryOptions,
    },

    /// Aggregate samples bucketed by a time interval.
    QueryStatisticsCollection {
        /// Quantity type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Aggregations to compute per bucket.
        aggregations: Vec<Aggregation>,
        /// Bucket interval plus date range.
        options: CollectionOptions,
    },

    /// Query activity (ring) summaries for a date range.
    QueryActivitySummary {
        /// Range start, inclusive.
        #[serde(rename = "startDate")]
        start_date: String,
        /// Range end, inclusive.
        #[serde(rename = "endDate")]
        end_date: String,
    },

    /// Persist one numeric sample.
    SaveQuantitySample {
        /// Quantity type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Measured value.
        value: f64,
        /// Unit string (e.g. `count/min`).
        unit: String,
        /// Sample start.
        #[serde(rename = "startDate")]
        start_date: String,
        /// Sample end.
        #[serde(rename = "endDate")]
        end_date: String,
        /// Optional metadata passed through to the platform.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },

    /// Persist one enumerated-value sample.
    SaveCategorySample {
        /// Category type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Enumerated value.
        value: i64,
        /// Sample start.
        #[serde(rename = "startDate")]
        start_date: String,
        /// Sample end.
        #[serde(rename = "endDate")]
        end_date: String,
        /// Optional metadata passed through to the platform.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },

    /// Persist one workout.
    SaveWorkout {
        /// Workout activity type (e.g. `running`).
        #[serde(rename = "activityType")]
        activity_type: String,
        /// Workout start.
        #[serde(rename = "startDate")]
        start_date: String,
        /// Workout end.
        #[serde(rename = "endDate")]
        end_date: String,
        /// Active energy burned, kilocalories.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        energy: Option<f64>,
        /// Distance covered, meters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
        /// Optional metadata passed through to the platform.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },

    /// Delete samples of one type within a date range.
    DeleteSamples {
        /// Sample type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Range start, inclusive.
        #[serde(rename = "startDate")]
        start_date: String,
        /// Range end, inclusive.
        #[serde(rename = "endDate")]
        end_date: String,
    },

    /// Read the authorization status for a set of types.
    GetAuthorizationStatus {
        /// Sample type identifiers to check.
        types: Vec<String>,
    },

    /// Prompt for read/write authorization.
    RequestAuthorization {
        /// Types requested for reading.
        #[serde(default)]
        read: Vec<String>,
        /// Types requested for writing.
        #[serde(default)]
        write: Vec<String>,
    },

    /// Fetch static user characteristics.
    GetCharacteristics {},

    /// Fetch platform availability/status.
    GetStatus {},

    /// Subscribe to changes of one sample type.
    SubscribeToChanges {
        /// Sample type identifier to observe.
        #[serde(rename = "type")]
        sample_type: String,
    },

    /// Cancel a change subscription.
    Unsubscribe {
        /// The subscription to cancel.
        #[serde(rename = "subscriptionId")]
        subscription_id: SubscriptionId,
    },
}

/// All wire operation names in the catalogue.
const OPERATION_NAMES: &[&str] = &[
    "queryQuantitySamples",
    "queryCategorySamples",
    "queryWorkouts",
    "queryStatistics",
    "queryStatisticsCollection",
    "queryActivitySummary",
    "saveQuantitySample",
    "saveCategorySample",
    "saveWorkout",
    "deleteSamples",
    "getAuthorizationStatus",
    "requestAuthorization",
    "getCharacteristics",
    "getStatus",
    "subscribeToChanges",
    "unsubscribe",
];

impl Operation {
    /// Returns `true` if `name` is a catalogued operation.
    ///
    /// Distinguishes an unknown operation from a known one with a
    /// malformed payload when parsing untyped wire input.
    #[inline]
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        OPERATION_NAMES.contains(&name)
    }

    /// Returns the wire name of this operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueryQuantitySamples { .. } => "queryQuantitySamples",
            Self::QueryCategorySamples { .. } => "queryCategorySamples",
            Self::QueryWorkouts { .. } => "queryWorkouts",
            Self::QueryStatistics { .. } => "queryStatistics",
            Self::QueryStatisticsCollection { .. } => "queryStatisticsCollection",
            Self::QueryActivitySummary { .. } => "queryActivitySummary",
            Self::SaveQuantitySample { .. } => "saveQuantitySample",
            Self::SaveCategorySample { .. } => "saveCategorySample",
            Self::SaveWorkout { .. } => "saveWorkout",
            Self::DeleteSamples { .. } => "deleteSamples",
            Self::GetAuthorizationStatus { .. } => "getAuthorizationStatus",
            Self::RequestAuthorization { .. } => "requestAuthorization",
            Self::GetCharacteristics {} => "getCharacteristics",
            Self::GetStatus {} => "getStatus",
            Self::SubscribeToChanges { .. } => "subscribeToChanges",
            Self::Unsubscribe { .. } => "unsubscribe",
        }
    }
}

// ============================================================================
// QueryOptions
// ============================================================================

/// Common query options: date range, limit and sort order.
///
/// All fields optional; an absent range means "everything".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Range start, inclusive.
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Range end, inclusive.
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Maximum number of samples to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Sort ascending by start date (default: descending).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
}

impl QueryOptions {
    /// Creates empty options (no range, no limit, default order).
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range start.
    #[inline]
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Sets the range end.
    #[inline]
    #[must_use]
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Sets the sample limit.
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets ascending sort order.
    #[inline]
    #[must_use]
    pub fn with_ascending(mut self, ascending: bool) -> Self {
        self.ascending = Some(ascending);
        self
    }
}

// ============================================================================
// CollectionOptions
// ============================================================================

/// Options for bucketed statistics queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Bucket interval.
    pub interval: Interval,

    /// Date range, limit and sort order.
    #[serde(flatten)]
    pub query: QueryOptions,
}

// ============================================================================
// Aggregation
// ============================================================================

/// Statistics aggregation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    /// Sum of sample values.
    Sum,
    /// Arithmetic mean of sample values.
    Average,
    /// Minimum sample value.
    Min,
    /// Maximum sample value.
    Max,
    /// Value of the most recent sample.
    MostRecent,
}

// ============================================================================
// Interval
// ============================================================================

/// Bucket intervals for statistics-collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// One-hour buckets.
    Hour,
    /// One-day buckets.
    Day,
    /// One-week buckets.
    Week,
    /// One-month buckets.
    Month,
    /// One-year buckets.
    Year,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_quantity_samples_wire_shape() {
        let op = Operation::QueryQuantitySamples {
            sample_type: "heartRate".to_string(),
            options: QueryOptions::new()
                .with_start_date("2026-01-04T00:00:00.000Z")
                .with_limit(10),
        };

        let json = serde_json::to_value(&op).expect("serialize");
        assert_eq!(json["type"], "queryQuantitySamples");
        assert_eq!(json["payload"]["type"], "heartRate");
        assert_eq!(json["payload"]["options"]["startDate"], "2026-01-04T00:00:00.000Z");
        assert_eq!(json["payload"]["options"]["limit"], 10);
        // Unset options stay off the wire
        assert!(json["payload"]["options"].get("endDate").is_none());
    }

    #[test]
    fn test_save_quantity_sample_wire_shape() {
        let op = Operation::SaveQuantitySample {
            sample_type: "heartRate".to_string(),
            value: 72.0,
            unit: "count/min".to_string(),
            start_date: "2026-01-04T08:00:00.000Z".to_string(),
            end_date: "2026-01-04T08:00:00.000Z".to_string(),
            metadata: None,
        };

        let json = serde_json::to_value(&op).expect("serialize");
        assert_eq!(json["type"], "saveQuantitySample");
        assert_eq!(json["payload"]["value"], 72.0);
        assert_eq!(json["payload"]["unit"], "count/min");
        assert!(json["payload"].get("metadata").is_none());
    }

    #[test]
    fn test_statistics_collection_interval_flattened() {
        let op = Operation::QueryStatisticsCollection {
            sample_type: "stepCount".to_string(),
            aggregations: vec![Aggregation::Sum, Aggregation::MostRecent],
            options: CollectionOptions {
                interval: Interval::Day,
                query: QueryOptions::new().with_start_date("2026-01-01T00:00:00.000Z"),
            },
        };

        let json = serde_json::to_value(&op).expect("serialize");
        assert_eq!(json["payload"]["options"]["interval"], "day");
        assert_eq!(json["payload"]["options"]["startDate"], "2026-01-01T00:00:00.000Z");
        assert_eq!(json["payload"]["aggregations"][1], "mostRecent");
    }

    #[test]
    fn test_operation_roundtrip_from_wire() {
        let wire = r#"{
            "type": "deleteSamples",
            "payload": {
                "type": "stepCount",
                "startDate": "2026-01-04T00:00:00.000Z",
                "endDate": "2026-01-04T23:59:59.999Z"
            }
        }"#;

        let op: Operation = serde_json::from_str(wire).expect("parse");
        assert!(matches!(op, Operation::DeleteSamples { .. }));
        assert_eq!(op.name(), "deleteSamples");
    }

    #[test]
    fn test_unknown_operation_fails_typed_parse() {
        let wire = r#"{"type": "queryMoonPhase", "payload": {}}"#;
        assert!(serde_json::from_str::<Operation>(wire).is_err());
    }

    #[test]
    fn test_operation_names() {
        let op = Operation::GetStatus {};
        assert_eq!(op.name(), "getStatus");

        let op = Operation::Unsubscribe {
            subscription_id: crate::identifiers::SubscriptionId::new("sub-1"),
        };
        assert_eq!(op.name(), "unsubscribe");
    }
}
