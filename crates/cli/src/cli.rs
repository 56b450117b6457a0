//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// FootSole - recorder for the 208-channel pressure insole
#[derive(Parser, Debug)]
#[command(
    name = "footsole",
    author,
    version,
    about = "FootSole pressure insole recorder",
    long_about = "Records the 208-channel pressure stream of a FootSole insole.\n\n\
                  Locks onto firmware frames in the raw notification stream, validates \n\
                  their checksums, and writes every decoded reading to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FOOTSOLE_VERBOSE")]
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
        env = "FOOTSOLE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record one capture session
    Record(RecordArgs),

    /// Validate configuration file without recording
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `record` command
#[derive(Parser, Debug, Clone)]
pub struct RecordArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults if omitted
    #[arg(short, long, env = "FOOTSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Device name (overrides configuration)
    #[arg(short, long, env = "FOOTSOLE_DEVICE")]
    pub name: Option<String>,

    /// Record the left insole (default: right)
    #[arg(long)]
    pub left: bool,

    /// Recording length in seconds (0 = until disconnect or Ctrl+C)
    #[arg(short, long, env = "FOOTSOLE_DURATION")]
    pub duration: Option<u64>,

    /// Where raw bytes come from
    #[arg(long, value_enum, default_value = "simulate")]
    pub source: SourceKind,

    /// Raw capture file for `--source replay`
    #[arg(short, long, required_if_eq("source", "replay"))]
    pub input: Option<PathBuf>,

    /// Bytes per delivered chunk (notification payload size)
    #[arg(long, default_value = "244")]
    pub chunk_size: usize,

    /// Replay/stdin: milliseconds between chunks (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    pub pace_ms: u64,

    /// Simulated frame rate in Hz
    #[arg(long, default_value = "50")]
    pub rate: f64,

    /// Simulated source: corrupt every n-th frame
    #[arg(long)]
    pub corrupt_every: Option<u64>,

    /// Simulated source: stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Output directory; replaces configured file sinks
    #[arg(short, long, env = "FOOTSOLE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output file format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Seconds between progress logs (0 = disabled)
    #[arg(long, default_value = "5")]
    pub status_interval: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FOOTSOLE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without recording
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "capture.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults if omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Raw byte source
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Built-in frame generator
    Simulate,
    /// Raw capture file
    Replay,
    /// Raw bytes piped on stdin
    Stdin,
}

/// File sink format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
