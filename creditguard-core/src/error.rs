use std::path::PathBuf;

/// Errors and reportable conditions from the telemetry recorder and
/// aggregator.
///
/// `NoLogsFound` and `LogEmpty` are expected operational states (first run,
/// freshly initialized store), not data corruption; callers should report
/// them rather than treat them as failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no logs found at {}", path.display())]
    NoLogsFound { path: PathBuf },

    #[error("log file is empty: {}", path.display())]
    LogEmpty { path: PathBuf },

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("store schema mismatch: expected header '{expected}', got '{actual}'")]
    SchemaMismatch { expected: String, actual: String },

    #[error("invalid decision record: {reason}")]
    InvalidRecord { reason: String },
}
