use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which decision path serviced a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    MlOnly,
    LlmOnly,
    Hybrid,
}

impl RoutingStrategy {
    /// Stable tag written to the telemetry store.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::MlOnly => "ml_only",
            Self::LlmOnly => "llm_only",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Final categorical outcome of an evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approve,
    Deny,
    Review,
}

impl DecisionOutcome {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
            Self::Review => "review",
        }
    }
}

/// Output of the ML scoring path. Both scores are probabilities in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MlPrediction {
    pub confidence_score: f64,
    pub default_probability: f64,
}

/// Result from one agent in the LLM path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: String,
    pub tokens_used: u64,
}

/// Outcome of the fairness override check, when it ran.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FairnessCheck {
    pub is_triggered: bool,
    pub decision_changed: bool,
}

/// The finalized outcome of one evaluated request, handed to the telemetry
/// recorder by the decision engine.
///
/// `ml_prediction` is absent when no ML path ran; `llm_results` is empty
/// when no LLM path ran; `fairness_check` is absent when fairness logic
/// was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditDecision {
    pub timestamp: DateTime<Utc>,
    pub applicant_id: String,
    pub routing_strategy_used: RoutingStrategy,
    pub ml_prediction: Option<MlPrediction>,
    #[serde(default)]
    pub llm_results: Vec<AgentResult>,
    pub total_tokens: u64,
    pub processing_time_ms: f64,
    pub fairness_check: Option<FairnessCheck>,
    pub decision: DecisionOutcome,
    pub final_risk_score: f64,
}

impl CreditDecision {
    /// Sum of per-agent token usage across the LLM path. Zero when the
    /// request never touched an LLM.
    pub fn prompt_tokens(&self) -> u64 {
        self.llm_results.iter().map(|r| r.tokens_used).sum()
    }
}
