//! NDJSON batch import.
//!
//! Reads newline-delimited JSON records, resolves their relative dates,
//! and saves each as a sample through the client. Lines are processed
//! independently: a malformed line is recorded as a per-line failure and
//! never aborts the batch.
//!
//! # Record format
//!
//! One JSON object per line, tagged by `kind`:
//!
//! ```json
//! {"kind":"quantity","type":"heartRate","value":72,"unit":"count/min","start":"today 8am"}
//! {"kind":"category","type":"sleepAnalysis","value":1,"start":"-8h","duration":"7h30m"}
//! {"kind":"workout","activityType":"running","start":"-1h","duration":"45m","energy":320}
//! ```
//!
//! `start` defaults to `now`; `end` defaults to `start + duration` when a
//! duration is given, otherwise to `start`.

// ============================================================================
// Imports
// ============================================================================

use std::io::BufRead;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::HealthClient;
use crate::error::{Error, Result};
use crate::protocol::Operation;
use crate::reldate::{parse_duration, parse_relative_date};

// ============================================================================
// ImportRecord
// ============================================================================

/// One batch input record.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportRecord {
    /// A numeric sample.
    Quantity {
        /// Quantity type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Measured value.
        value: f64,
        /// Unit string.
        unit: String,
        /// Start expression (defaults to `now`).
        start: Option<String>,
        /// End expression.
        end: Option<String>,
        /// Duration expression applied to the resolved start.
        duration: Option<String>,
        /// Optional metadata.
        metadata: Option<Value>,
    },

    /// An enumerated-value sample.
    Category {
        /// Category type identifier.
        #[serde(rename = "type")]
        sample_type: String,
        /// Enumerated value.
        value: i64,
        /// Start expression (defaults to `now`).
        start: Option<String>,
        /// End expression.
        end: Option<String>,
        /// Duration expression applied to the resolved start.
        duration: Option<String>,
        /// Optional metadata.
        metadata: Option<Value>,
    },

    /// A workout.
    Workout {
        /// Workout activity type.
        #[serde(rename = "activityType")]
        activity_type: String,
        /// Start expression (defaults to `now`).
        start: Option<String>,
        /// End expression.
        end: Option<String>,
        /// Duration expression applied to the resolved start.
        duration: Option<String>,
        /// Active energy burned, kilocalories.
        energy: Option<f64>,
        /// Distance covered, meters.
        distance: Option<f64>,
        /// Optional metadata.
        metadata: Option<Value>,
    },
}

impl ImportRecord {
    /// Resolves dates and shapes the record into a save operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateParse`] if any date expression fails to
    /// resolve.
    pub fn into_operation(self, now: DateTime<Local>) -> Result<Operation> {
        match self {
            Self::Quantity {
                sample_type,
                value,
                unit,
                start,
                end,
                duration,
                metadata,
            } => {
                let (start_date, end_date) = resolve_window(start, end, duration, now)?;
                Ok(Operation::SaveQuantitySample {
                    sample_type,
                    value,
                    unit,
                    start_date,
                    end_date,
                    metadata,
                })
            }

            Self::Category {
                sample_type,
                value,
                start,
                end,
                duration,
                metadata,
            } => {
                let (start_date, end_date) = resolve_window(start, end, duration, now)?;
                Ok(Operation::SaveCategorySample {
                    sample_type,
                    value,
                    start_date,
                    end_date,
                    metadata,
                })
            }

            Self::Workout {
                activity_type,
                start,
                end,
                duration,
                energy,
                distance,
                metadata,
            } => {
                let (start_date, end_date) = resolve_window(start, end, duration, now)?;
                Ok(Operation::SaveWorkout {
                    activity_type,
                    start_date,
                    end_date,
                    energy,
                    distance,
                    metadata,
                })
            }
        }
    }
}

/// Resolves the `(start, end)` pair for one record.
///
/// Missing start means "now"; end precedence is explicit end, then
/// start + duration, then start itself.
fn resolve_window(
    start: Option<String>,
    end: Option<String>,
    duration: Option<String>,
    now: DateTime<Local>,
) -> Result<(String, String)> {
    let start_date = parse_relative_date(start.as_deref().unwrap_or("now"), now)?;

    let end_date = match (end, duration) {
        (Some(end), _) => parse_relative_date(&end, now)?,
        (None, Some(duration)) => parse_duration(&start_date, &duration)?,
        (None, None) => start_date.clone(),
    };

    Ok((start_date, end_date))
}

// ============================================================================
// ImportSummary
// ============================================================================

/// Per-line failure in a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based line number within the input.
    pub line: usize,
    /// Failure message.
    pub message: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of non-empty lines processed.
    pub total: usize,
    /// Lines saved successfully.
    pub succeeded: usize,
    /// Lines that failed (parse or save).
    pub failed: usize,
    /// One entry per failed line.
    pub failures: Vec<BatchFailure>,
}

impl ImportSummary {
    /// Returns `true` when no line failed.
    ///
    /// The importer process exits non-zero otherwise.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record_failure(&mut self, line: usize, error: &Error) {
        self.failed += 1;
        self.failures.push(BatchFailure {
            line,
            message: error.to_string(),
        });
        warn!(line, error = %error, "Batch line failed");
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs a batch import from an NDJSON reader.
///
/// Empty lines are skipped. Each remaining line is parsed, resolved
/// against the current wall clock, and saved through the client; any
/// failure is recorded against its line number and the batch continues.
pub async fn run(client: &HealthClient, reader: impl BufRead) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                summary.total += 1;
                summary.record_failure(line_number, &Error::Io(e));
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        summary.total += 1;

        match import_line(client, &line).await {
            Ok(()) => {
                summary.succeeded += 1;
                debug!(line = line_number, "Saved");
            }
            Err(e) => {
                let error = Error::batch_line(line_number, e.to_string());
                summary.record_failure(line_number, &error);
            }
        }
    }

    summary
}

/// Parses, resolves and saves one line.
async fn import_line(client: &HealthClient, line: &str) -> Result<()> {
    let record: ImportRecord = serde_json::from_str(line)?;
    let operation = record.into_operation(Local::now())?;
    client.call(operation).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
