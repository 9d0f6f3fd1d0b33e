//! CLI argument definitions for the protocol extractor.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ctp_cli::settings::ConfigOverrides;
use ctp_core::Backend;

#[derive(Parser)]
#[command(
    name = "ctp",
    version,
    about = "Clinical trial protocol extractor - PDF protocols to structured XML",
    long_about = "Extract structured clinical trial fields from protocol PDFs.\n\n\
                  Text is split into overlapping chunks, fields are inferred per chunk\n\
                  by a rule-based or LLM backend, and the merged record is written\n\
                  as XML."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract fields from a protocol PDF and write XML.
    Extract(ExtractArgs),

    /// Render a reviewed JSON record to XML.
    Render(RenderArgs),

    /// List every record field with its mapping key and XML path.
    Fields,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// Protocol PDF to read, or `-` for stdin.
    #[arg(value_name = "PDF")]
    pub input: PathBuf,

    /// XML output path (default: <PDF stem>.xml, or clinical_trial.xml for stdin).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the merged record as JSON for review.
    #[arg(long = "record-out", value_name = "FILE")]
    pub record_out: Option<PathBuf>,

    /// Pipeline configuration file (TOML).
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Password for an encrypted PDF.
    #[arg(long = "password", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Inference backend.
    #[arg(long = "backend", value_enum)]
    pub backend: Option<BackendArg>,

    /// Maximum chunk size in characters.
    #[arg(long = "chunk-size", value_name = "CHARS")]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks.
    #[arg(long = "overlap", value_name = "CHARS")]
    pub overlap: Option<usize>,

    /// Per-chunk inference timeout in seconds.
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Number of chunks inferred concurrently.
    #[arg(long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long = "llm-endpoint", value_name = "URL")]
    pub llm_endpoint: Option<String>,

    /// Model name sent to the LLM endpoint.
    #[arg(long = "llm-model", value_name = "MODEL")]
    pub llm_model: Option<String>,
}

impl ExtractArgs {
    /// Flags that take precedence over the configuration file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.map(Backend::from),
            max_chars: self.chunk_size,
            overlap: self.overlap,
            timeout_secs: self.timeout_secs,
            concurrency: self.concurrency,
            llm_endpoint: self.llm_endpoint.clone(),
            llm_model: self.llm_model.clone(),
        }
    }
}

#[derive(Parser)]
pub struct RenderArgs {
    /// JSON record, as written by `extract --record-out`.
    #[arg(value_name = "RECORD")]
    pub record: PathBuf,

    /// XML output path (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Rules,
    Llm,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Rules => Backend::Rules,
            BackendArg::Llm => Backend::Llm,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
