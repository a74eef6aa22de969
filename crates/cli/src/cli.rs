//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tick Dispatcher - at-most-one-in-flight, tick-driven message dispatch
#[derive(Parser, Debug)]
#[command(
    name = "tick-dispatcher",
    author,
    version,
    about = "Tick-driven dispatcher demo",
    long_about = "Runs a dispatcher that holds a single pending message, polls it on a \n\
                  fixed tick and launches at most one handler at a time. Publishes \n\
                  arriving while a handler runs are dropped."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TICK_DISPATCHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TICK_DISPATCHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo: register handlers, drive ticks, publish random payloads
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in demo when omitted
    #[arg(short, long, env = "TICK_DISPATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override tick interval in milliseconds
    #[arg(long, env = "TICK_DISPATCHER_TICK_INTERVAL_MS")]
    pub tick_interval_ms: Option<u64>,

    /// Stop after this many publishes (0 = unlimited)
    #[arg(long, default_value = "0", env = "TICK_DISPATCHER_MAX_PUBLISHES")]
    pub max_publishes: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TICK_DISPATCHER_TIMEOUT")]
    pub timeout: u64,

    /// Seed for payload and interval selection (random when omitted)
    #[arg(long, env = "TICK_DISPATCHER_SEED")]
    pub seed: Option<u64>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TICK_DISPATCHER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file; validates the built-in demo when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; describes the built-in demo when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
