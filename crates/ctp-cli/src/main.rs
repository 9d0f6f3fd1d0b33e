//! Clinical trial protocol extractor CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use ctp_cli::logging::{LogConfig, LogFormat, init_logging};
use ctp_core::{ConfigError, PipelineError};
use ctp_output::SerializationError;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_extract, run_fields, run_render};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let outcome = match &cli.command {
        Command::Extract(args) => run_extract(args).map(|result| print_summary(&result)),
        Command::Render(args) => run_render(args),
        Command::Fields => run_fields(),
    };
    let exit_code = match outcome {
        Ok(()) => 0,
        Err(error) => {
            report(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

fn report(error: &anyhow::Error) {
    eprintln!("error: {error:#}");
    if let Some(hint) = suggestion(error) {
        eprintln!("hint: {hint}");
    }
}

fn suggestion(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<PipelineError>() {
            e.suggestion()
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            e.suggestion()
        } else if let Some(e) = cause.downcast_ref::<SerializationError>() {
            e.suggestion()
        } else {
            None
        }
    })
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
