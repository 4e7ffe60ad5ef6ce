// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `shipit`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shipit",
    version,
    about = "Run a release-build pipeline: resolve a version, build stages across targets, publish.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `$SHIPIT_CONFIG`, falling back to `Shipit.toml` in the
    /// current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Parse + validate, print the stage plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Run resolver and all stages, but leave the release in draft state.
    #[arg(long)]
    pub skip_publish: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHIPIT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
