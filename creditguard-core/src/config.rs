use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level CreditGuard configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreditGuardConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Telemetry store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Path of the append-only evaluation log. Parent directories are
    /// created on demand.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/research_logs.csv")
}
