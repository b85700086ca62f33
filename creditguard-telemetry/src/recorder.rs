use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, instrument, warn};

use creditguard_core::decision::CreditDecision;
use creditguard_core::error::TelemetryError;

use crate::schema::{self, LogRow};

/// Appends exactly one row per evaluated request to the telemetry store.
///
/// The recorder owns the store path; there is no ambient global state, so
/// tests can point each recorder at an isolated temporary store. In-process
/// concurrent appenders serialize through an internal writer lock. Each
/// append opens, writes, flushes and closes the file before returning, so
/// a crash between appends cannot lose buffered rows.
pub struct TelemetryRecorder {
    log_path: PathBuf,
    writer_lock: Mutex<()>,
}

impl TelemetryRecorder {
    /// Create a recorder for the given store path, creating parent
    /// directories on demand and writing the header if the store does not
    /// exist yet. Idempotent: an existing store is left untouched.
    pub fn new(log_path: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if !log_path.exists() {
            std::fs::write(&log_path, format!("{}\n", schema::header_line()))?;
            info!(path = %log_path.display(), "telemetry store created");
        }
        Ok(Self {
            log_path,
            writer_lock: Mutex::new(()),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Append one row for the given decision.
    ///
    /// `key_switches` is the number of credential rotations the caller
    /// observed while servicing this request; rotation happens outside the
    /// recorder and cannot be reconstructed from the decision itself.
    ///
    /// I/O failures propagate unchanged; no partial row is ever written
    /// because the line is fully formatted before the file is opened.
    #[instrument(skip(self, decision), fields(applicant_id = %decision.applicant_id))]
    pub fn append(
        &self,
        decision: &CreditDecision,
        key_switches: u64,
    ) -> Result<(), TelemetryError> {
        if decision.applicant_id.is_empty() {
            return Err(TelemetryError::InvalidRecord {
                reason: "applicant_id is empty".into(),
            });
        }
        // A comma would shift columns and a newline would split the row
        // across physical lines; either way summarize could no longer read
        // the store.
        if decision
            .applicant_id
            .contains(|c: char| c == ',' || c.is_control())
        {
            return Err(TelemetryError::InvalidRecord {
                reason: format!(
                    "applicant_id '{}' contains a comma or control character",
                    decision.applicant_id.escape_debug()
                ),
            });
        }

        let prompt_tokens = decision.prompt_tokens();
        let completion_tokens = i64::try_from(decision.total_tokens)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(prompt_tokens).unwrap_or(i64::MAX));
        if completion_tokens < 0 {
            warn!(
                total_tokens = decision.total_tokens,
                prompt_tokens,
                "prompt tokens exceed total tokens; recording negative completion count as-is"
            );
        }

        let row = LogRow {
            timestamp: decision.timestamp,
            applicant_id: decision.applicant_id.clone(),
            routing_strategy: decision.routing_strategy_used.as_tag().to_string(),
            ml_confidence_score: decision.ml_prediction.map(|p| p.confidence_score),
            ml_prediction: decision.ml_prediction.map(|p| p.default_probability),
            total_tokens: decision.total_tokens,
            prompt_tokens,
            completion_tokens,
            latency_ms: decision.processing_time_ms,
            active_key_id: active_key_id(decision).to_string(),
            key_switches,
            is_fairness_triggered: decision
                .fairness_check
                .map(|f| f.is_triggered)
                .unwrap_or(false),
            fairness_decision_changed: decision
                .fairness_check
                .map(|f| f.decision_changed)
                .unwrap_or(false),
            final_decision: decision.decision.as_tag().to_string(),
            risk_score: decision.final_risk_score,
        };
        let encoded = row.encode();

        let _guard = self
            .writer_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new().append(true).open(&self.log_path)?;
        writeln!(file, "{encoded}")?;
        file.flush()?;

        debug!(
            total_tokens = decision.total_tokens,
            key_switches,
            strategy = decision.routing_strategy_used.as_tag(),
            "decision recorded"
        );
        Ok(())
    }
}

/// Which credential serviced the request. The recorder only sees the
/// decision record, which does not carry the specific key id, so it can
/// only distinguish LLM-backed requests from ML-only ones.
fn active_key_id(decision: &CreditDecision) -> &'static str {
    if decision.llm_results.is_empty() {
        "ml_only"
    } else {
        "key_used"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    use creditguard_core::decision::{
        AgentResult, DecisionOutcome, FairnessCheck, MlPrediction, RoutingStrategy,
    };

    fn make_decision(applicant_id: &str) -> CreditDecision {
        CreditDecision {
            timestamp: Utc::now(),
            applicant_id: applicant_id.into(),
            routing_strategy_used: RoutingStrategy::MlOnly,
            ml_prediction: Some(MlPrediction {
                confidence_score: 0.9,
                default_probability: 0.1,
            }),
            llm_results: vec![],
            total_tokens: 0,
            processing_time_ms: 5.0,
            fairness_check: None,
            decision: DecisionOutcome::Approve,
            final_risk_score: 0.2,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .expect("read store")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn initialization_is_idempotent() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("logs").join("evals.csv");

        let recorder = TelemetryRecorder::new(&path).expect("first init");
        recorder
            .append(&make_decision("app-1"), 0)
            .expect("append");

        // Second init must not clobber existing data.
        let _again = TelemetryRecorder::new(&path).expect("second init");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], schema::header_line());
    }

    #[test]
    fn fresh_store_has_header_and_no_rows() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");

        let _recorder = TelemetryRecorder::new(&path).expect("init");
        let _recorder = TelemetryRecorder::new(&path).expect("re-init");

        let lines = read_lines(&path);
        assert_eq!(lines, vec![schema::header_line()]);
    }

    #[test]
    fn one_row_per_append_in_call_order() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        for i in 0..5 {
            recorder
                .append(&make_decision(&format!("app-{i}")), 0)
                .expect("append");
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 6);
        for (i, line) in lines[1..].iter().enumerate() {
            assert!(line.contains(&format!("app-{i},")));
        }
    }

    #[test]
    fn token_arithmetic_in_written_row() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let mut decision = make_decision("app-tok");
        decision.routing_strategy_used = RoutingStrategy::Hybrid;
        decision.llm_results = vec![
            AgentResult {
                agent_name: "underwriter".into(),
                tokens_used: 60,
            },
            AgentResult {
                agent_name: "verifier".into(),
                tokens_used: 10,
            },
        ];
        decision.total_tokens = 100;

        recorder.append(&decision, 0).expect("append");

        let lines = read_lines(&path);
        let row = LogRow::parse(&lines[1], 2).expect("parse row");
        assert_eq!(row.total_tokens, 100);
        assert_eq!(row.prompt_tokens, 70);
        assert_eq!(row.completion_tokens, 30);
        assert_eq!(row.active_key_id, "key_used");
    }

    #[test]
    fn negative_completion_tokens_pass_through() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let mut decision = make_decision("app-neg");
        decision.llm_results = vec![AgentResult {
            agent_name: "underwriter".into(),
            tokens_used: 70,
        }];
        decision.total_tokens = 50;

        recorder.append(&decision, 0).expect("append");

        let lines = read_lines(&path);
        let row = LogRow::parse(&lines[1], 2).expect("parse row");
        assert_eq!(row.completion_tokens, -20);
    }

    #[test]
    fn missing_ml_prediction_writes_empty_fields_not_zero() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let mut decision = make_decision("app-llm");
        decision.ml_prediction = None;
        decision.routing_strategy_used = RoutingStrategy::LlmOnly;

        recorder.append(&decision, 0).expect("append");

        let lines = read_lines(&path);
        assert!(lines[1].contains("llm_only,,,"));
        let row = LogRow::parse(&lines[1], 2).expect("parse row");
        assert_eq!(row.ml_confidence_score, None);
        assert_eq!(row.ml_prediction, None);
    }

    #[test]
    fn ml_only_request_tags_key_id() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        recorder.append(&make_decision("app-ml"), 0).expect("append");

        let lines = read_lines(&path);
        let row = LogRow::parse(&lines[1], 2).expect("parse row");
        assert_eq!(row.active_key_id, "ml_only");
    }

    #[test]
    fn absent_fairness_check_records_false_tokens() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        recorder
            .append(&make_decision("app-fair"), 0)
            .expect("append");

        let mut triggered = make_decision("app-trig");
        triggered.fairness_check = Some(FairnessCheck {
            is_triggered: true,
            decision_changed: false,
        });
        recorder.append(&triggered, 0).expect("append");

        let lines = read_lines(&path);
        assert!(lines[1].contains(",False,False,"));
        assert!(lines[2].contains(",True,False,"));
    }

    #[test]
    fn empty_applicant_id_rejected_before_any_write() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let err = recorder
            .append(&make_decision(""), 0)
            .expect_err("should fail");
        assert!(matches!(err, TelemetryError::InvalidRecord { .. }));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn comma_in_applicant_id_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let err = recorder
            .append(&make_decision("app,1"), 0)
            .expect_err("should fail");
        assert!(matches!(err, TelemetryError::InvalidRecord { .. }));
    }

    #[test]
    fn newline_in_applicant_id_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        for id in ["app\n8841", "app\r8841", "app\t8841"] {
            let err = recorder
                .append(&make_decision(id), 0)
                .expect_err("should fail");
            assert!(matches!(err, TelemetryError::InvalidRecord { .. }));
        }

        // One append must never become more than one physical line.
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn oversized_token_counts_do_not_wrap() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        let mut decision = make_decision("app-huge");
        decision.total_tokens = u64::MAX;

        recorder.append(&decision, 0).expect("append");

        let lines = read_lines(&path);
        let row = LogRow::parse(&lines[1], 2).expect("parse row");
        assert_eq!(row.completion_tokens, i64::MAX);
    }

    #[test]
    fn append_fails_when_store_removed() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("evals.csv");
        let recorder = TelemetryRecorder::new(&path).expect("init");

        std::fs::remove_file(&path).expect("remove store");

        let err = recorder
            .append(&make_decision("app-io"), 0)
            .expect_err("should fail");
        assert!(matches!(err, TelemetryError::Io(_)));
    }
}
