// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `testrelay`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testrelay",
    version,
    about = "Run test modules as the build discovers them.",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments for the default `run` command.
    #[command(flatten)]
    pub run: RunArgs,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTRELAY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build, discover and run test modules (default).
    Run(RunArgs),

    /// Report one test module to a running coordinator (build side).
    Notify(NotifyArgs),

    /// Execute a managed test library through the configured runner.
    Exec(ExecArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Skip compilation; only discover already-built test modules.
    #[arg(long)]
    pub no_build: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `testrelay.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Extra arguments passed through to the build program.
    #[arg(last = true, value_name = "BUILD_ARGS")]
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct NotifyArgs {
    /// Discovery channel identifier handed to the build.
    #[arg(long, value_name = "ID")]
    pub channel: String,

    /// Path of the test module to report.
    #[arg(value_name = "PATH")]
    pub module: String,
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Managed test library to execute.
    #[arg(value_name = "LIBRARY")]
    pub library: PathBuf,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
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

impl CliArgs {
    /// The command to run, with bare invocation meaning `run`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
