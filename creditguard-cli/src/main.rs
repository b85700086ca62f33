mod cli;
mod config;
mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, StoreArgs};
use creditguard_core::config::CreditGuardConfig;
use creditguard_core::error::TelemetryError;
use creditguard_telemetry::{summarize, TelemetryRecorder};
use output::{print_error, print_message, print_summary};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Telemetry(#[from] TelemetryError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Telemetry(
                TelemetryError::NoLogsFound { .. } | TelemetryError::LogEmpty { .. },
            ) => 3,
            Self::Telemetry(_) => 4,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Init(ref args) => run_init(args, json_mode),
        Command::Summary(ref args) => run_summary(args, json_mode),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        print_error(json_mode, &err.to_string(), code);
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the store path: explicit flag wins, then config file, then the
/// built-in default.
fn resolve_log_path(args: &StoreArgs) -> Result<PathBuf, CliError> {
    if let Some(ref path) = args.log_path {
        return Ok(path.clone());
    }
    if let Some(ref config_path) = args.config {
        let config =
            config::load_config(config_path).map_err(|e| CliError::Usage(format!("{e:#}")))?;
        return Ok(config.telemetry.log_path);
    }
    Ok(CreditGuardConfig::default().telemetry.log_path)
}

fn run_init(args: &StoreArgs, json_mode: bool) -> Result<(), CliError> {
    let log_path = resolve_log_path(args)?;
    let recorder = TelemetryRecorder::new(&log_path)?;
    print_message(
        json_mode,
        &format!("telemetry store ready at {}", recorder.log_path().display()),
    );
    Ok(())
}

fn run_summary(args: &StoreArgs, json_mode: bool) -> Result<(), CliError> {
    let log_path = resolve_log_path(args)?;
    let summary = summarize(&log_path)?;
    print_summary(json_mode, &summary);
    Ok(())
}
