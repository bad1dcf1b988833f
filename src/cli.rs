// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `provisioner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "provisioner",
    version,
    about = "Run an ordered list of setup jobs and reboot once at the end if needed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the agent configuration (TOML).
    ///
    /// Default: `Provisioner.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROVISIONER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate every job, print the run order, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Never restart the host, even when a job asks for it.
    #[arg(long)]
    pub no_reboot: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
