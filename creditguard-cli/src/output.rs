use creditguard_telemetry::EvaluationSummary;

/// Render a summary either as the stable JSON envelope or as a
/// human-readable report.
pub fn print_summary(json_mode: bool, summary: &EvaluationSummary) {
    if json_mode {
        match serde_json::to_value(summary) {
            Ok(result) => print_success_envelope(&result),
            Err(e) => print_error(true, &format!("encoding summary: {e}"), 1),
        }
        return;
    }

    println!("evaluations: {}", summary.total_evaluations);
    println!(
        "tokens:      total={} avg/request={:.1} est. cost=${:.6}",
        summary.token_usage.total,
        summary.token_usage.average_per_request,
        summary.token_usage.estimated_cost_usd,
    );
    println!(
        "latency:     avg {:.1} ms",
        summary.performance.average_latency_ms
    );

    println!("routing:");
    let mut strategies: Vec<_> = summary.routing_distribution.iter().collect();
    strategies.sort_by(|a, b| a.0.cmp(b.0));
    for (strategy, count) in strategies {
        println!("  {strategy}: {count}");
    }

    println!(
        "fairness:    triggers={} changes={} change_rate={:.2}",
        summary.fairness_metrics.triggers,
        summary.fairness_metrics.decision_changes,
        summary.fairness_metrics.change_rate,
    );
    println!(
        "resilience:  key_switches={} switch_rate={:.2}",
        summary.resilience.total_key_switches, summary.resilience.switch_rate,
    );
}

pub fn print_message(json_mode: bool, message: &str) {
    if json_mode {
        print_success_envelope(&serde_json::Value::String(message.to_string()));
        return;
    }
    println!("{message}");
}

pub fn print_error(json_mode: bool, message: &str, exit_code: i32) {
    if json_mode {
        let envelope = serde_json::json!({
            "ok": false,
            "error": {
                "message": message,
                "code": exit_code,
            }
        });
        eprintln!("{envelope}");
        return;
    }
    eprintln!("error: {message}");
}

fn print_success_envelope(result: &serde_json::Value) {
    let envelope = serde_json::json!({
        "ok": true,
        "result": result,
    });
    println!("{envelope}");
}
