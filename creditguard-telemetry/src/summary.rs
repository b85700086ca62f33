use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use creditguard_core::error::TelemetryError;

use crate::schema::{self, LogRow};

/// Placeholder per-token pricing used for the cost estimate. A mock
/// pricing model, not a live price feed.
pub const COST_PER_TOKEN_USD: f64 = 0.000_000_1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsageStats {
    pub total: u64,
    pub average_per_request: f64,
    pub estimated_cost_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub average_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairnessMetrics {
    /// Rows where the fairness check fired.
    pub triggers: u64,
    /// Rows where the fairness check overturned the decision.
    pub decision_changes: u64,
    /// changes / triggers; 0 when no row ever triggered.
    pub change_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceStats {
    pub total_key_switches: u64,
    pub switch_rate: f64,
}

/// Summary statistics derived from every row currently in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_evaluations: u64,
    pub token_usage: TokenUsageStats,
    pub performance: PerformanceStats,
    pub routing_distribution: HashMap<String, u64>,
    pub fairness_metrics: FairnessMetrics,
    pub resilience: ResilienceStats,
}

/// Recompute summary statistics from the full store.
///
/// Stateless between invocations: nothing is cached, the store is the only
/// state. The file is read into memory in a single pass, so the summary
/// reflects a snapshot taken at open time; rows appended while aggregating
/// are not observed.
#[instrument]
pub fn summarize(log_path: &Path) -> Result<EvaluationSummary, TelemetryError> {
    if !log_path.exists() {
        return Err(TelemetryError::NoLogsFound {
            path: log_path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(log_path)?;
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(TelemetryError::LogEmpty {
            path: log_path.to_path_buf(),
        });
    };
    let expected = schema::header_line();
    if header.trim() != expected {
        return Err(TelemetryError::SchemaMismatch {
            expected,
            actual: header.trim().to_string(),
        });
    }

    let mut rows = Vec::new();
    for (index, line) in lines {
        rows.push(LogRow::parse(line, index + 1)?);
    }
    if rows.is_empty() {
        return Err(TelemetryError::LogEmpty {
            path: log_path.to_path_buf(),
        });
    }

    let total = rows.len() as u64;
    let total_tokens: u64 = rows.iter().map(|r| r.total_tokens).sum();
    let average_latency_ms = rows.iter().map(|r| r.latency_ms).sum::<f64>() / total as f64;

    let mut routing_distribution: HashMap<String, u64> = HashMap::new();
    for row in &rows {
        *routing_distribution
            .entry(row.routing_strategy.clone())
            .or_insert(0) += 1;
    }

    let triggers = rows.iter().filter(|r| r.is_fairness_triggered).count() as u64;
    let decision_changes = rows
        .iter()
        .filter(|r| r.fairness_decision_changed)
        .count() as u64;
    let change_rate = if triggers > 0 {
        decision_changes as f64 / triggers as f64
    } else {
        0.0
    };

    let total_key_switches: u64 = rows.iter().map(|r| r.key_switches).sum();

    info!(
        total_evaluations = total,
        total_tokens, "telemetry summary computed"
    );

    Ok(EvaluationSummary {
        total_evaluations: total,
        token_usage: TokenUsageStats {
            total: total_tokens,
            average_per_request: total_tokens as f64 / total as f64,
            estimated_cost_usd: total_tokens as f64 * COST_PER_TOKEN_USD,
        },
        performance: PerformanceStats { average_latency_ms },
        routing_distribution,
        fairness_metrics: FairnessMetrics {
            triggers,
            decision_changes,
            change_rate,
        },
        resilience: ResilienceStats {
            total_key_switches,
            switch_rate: total_key_switches as f64 / total as f64,
        },
    })
}
