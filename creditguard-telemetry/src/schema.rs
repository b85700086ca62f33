//! Wire schema of the evaluation telemetry store.
//!
//! The store is a header-first, append-only CSV. Every writer and reader
//! goes through this module so the column order and the literal boolean
//! spelling stay a single explicit contract instead of scattered string
//! comparisons.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use creditguard_core::error::TelemetryError;

/// Fixed column order. The aggregator validates the header line against
/// this before parsing any data rows.
pub const COLUMNS: [&str; 15] = [
    "timestamp",
    "applicant_id",
    "routing_strategy",
    "ml_confidence_score",
    "ml_prediction",
    "total_tokens",
    "prompt_tokens",
    "completion_tokens",
    "latency_ms",
    "active_key_id",
    "key_switches",
    "is_fairness_triggered",
    "fairness_decision_changed",
    "final_decision",
    "risk_score",
];

/// Literal boolean tokens on the wire. Matched exactly on read-back.
pub const BOOL_TRUE: &str = "True";
pub const BOOL_FALSE: &str = "False";

pub fn header_line() -> String {
    COLUMNS.join(",")
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        BOOL_TRUE
    } else {
        BOOL_FALSE
    }
}

/// One flattened telemetry row. Built transiently by the recorder,
/// reparsed by the aggregator; never mutated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: DateTime<Utc>,
    pub applicant_id: String,
    pub routing_strategy: String,
    /// Empty on the wire when the ML path did not run, never a sentinel.
    pub ml_confidence_score: Option<f64>,
    pub ml_prediction: Option<f64>,
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    /// Signed: inconsistent producer input can push this negative and the
    /// recorder passes it through unchanged.
    pub completion_tokens: i64,
    pub latency_ms: f64,
    pub active_key_id: String,
    pub key_switches: u64,
    pub is_fairness_triggered: bool,
    pub fairness_decision_changed: bool,
    pub final_decision: String,
    pub risk_score: f64,
}

impl LogRow {
    /// Serialize in the fixed column order. The full line is formed in
    /// memory before any bytes are written to the store.
    pub fn encode(&self) -> String {
        [
            self.timestamp.to_rfc3339(),
            self.applicant_id.clone(),
            self.routing_strategy.clone(),
            encode_optional(self.ml_confidence_score),
            encode_optional(self.ml_prediction),
            self.total_tokens.to_string(),
            self.prompt_tokens.to_string(),
            self.completion_tokens.to_string(),
            self.latency_ms.to_string(),
            self.active_key_id.clone(),
            self.key_switches.to_string(),
            encode_bool(self.is_fairness_triggered).to_string(),
            encode_bool(self.fairness_decision_changed).to_string(),
            self.final_decision.clone(),
            self.risk_score.to_string(),
        ]
        .join(",")
    }

    /// Parse one data row. `line_number` is 1-based within the file and is
    /// carried into errors for diagnostics.
    pub fn parse(line: &str, line_number: usize) -> Result<Self, TelemetryError> {
        let values: Vec<&str> = line.split(',').collect();
        if values.len() != COLUMNS.len() {
            return Err(TelemetryError::MalformedRow {
                line: line_number,
                reason: format!(
                    "expected {} columns, got {}",
                    COLUMNS.len(),
                    values.len()
                ),
            });
        }

        let timestamp = DateTime::parse_from_rfc3339(values[0])
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| TelemetryError::MalformedRow {
                line: line_number,
                reason: format!("invalid timestamp '{}': {e}", values[0]),
            })?;

        Ok(Self {
            timestamp,
            applicant_id: values[1].to_string(),
            routing_strategy: values[2].to_string(),
            ml_confidence_score: parse_optional(values[3], "ml_confidence_score", line_number)?,
            ml_prediction: parse_optional(values[4], "ml_prediction", line_number)?,
            total_tokens: parse_field(values[5], "total_tokens", line_number)?,
            prompt_tokens: parse_field(values[6], "prompt_tokens", line_number)?,
            completion_tokens: parse_field(values[7], "completion_tokens", line_number)?,
            latency_ms: parse_field(values[8], "latency_ms", line_number)?,
            active_key_id: values[9].to_string(),
            key_switches: parse_field(values[10], "key_switches", line_number)?,
            is_fairness_triggered: parse_bool(values[11], "is_fairness_triggered", line_number)?,
            fairness_decision_changed: parse_bool(
                values[12],
                "fairness_decision_changed",
                line_number,
            )?,
            final_decision: values[13].to_string(),
            risk_score: parse_field(values[14], "risk_score", line_number)?,
        })
    }
}

fn encode_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn parse_field<T>(value: &str, column: &str, line: usize) -> Result<T, TelemetryError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e| TelemetryError::MalformedRow {
        line,
        reason: format!("invalid {column} '{value}': {e}"),
    })
}

fn parse_optional(value: &str, column: &str, line: usize) -> Result<Option<f64>, TelemetryError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_field(value, column, line).map(Some)
}

fn parse_bool(value: &str, column: &str, line: usize) -> Result<bool, TelemetryError> {
    match value {
        BOOL_TRUE => Ok(true),
        BOOL_FALSE => Ok(false),
        other => Err(TelemetryError::MalformedRow {
            line,
            reason: format!("invalid {column} '{other}': expected {BOOL_TRUE} or {BOOL_FALSE}"),
        }),
    }
}
