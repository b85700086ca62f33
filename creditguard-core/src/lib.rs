pub mod config;
pub mod decision;
pub mod error;

pub use decision::{
    AgentResult, CreditDecision, DecisionOutcome, FairnessCheck, MlPrediction, RoutingStrategy,
};
pub use error::TelemetryError;
