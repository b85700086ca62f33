pub mod recorder;
pub mod schema;
pub mod summary;

pub use recorder::TelemetryRecorder;
pub use summary::{summarize, EvaluationSummary};
