use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "creditctl",
    version,
    about = "CreditGuard evaluation telemetry CLI"
)]
pub struct Cli {
    /// Emit stable JSON envelopes.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (debug level).
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the telemetry store if it does not exist yet.
    Init(StoreArgs),
    /// Recompute summary statistics from the accumulated telemetry.
    Summary(StoreArgs),
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Telemetry store path. Takes precedence over --config.
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Config file path.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
