//! The `relnotes` command line.
//!
//! The parser lives in a library so `xtask` can render man pages and shell
//! completions from it via [`command()`]. `main.rs` wires it to config
//! loading, logging, and the [`commands`].

pub mod commands;

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the process-wide owo-colors override. `Auto` leaves detection on.
    pub fn apply(self) {
        let forced = match self {
            Self::Auto => return,
            Self::Always => true,
            Self::Never => false,
        };
        owo_colors::set_override(forced);
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                      Log filter (e.g., debug, relnotes=trace)
    RELNOTES_LOG_PATH             Explicit log file path
    RELNOTES_LOG_DIR              Log directory
    GITHUB_REPOSITORY             Default repository for `build`
    GITHUB_OUTPUT                 File that receives `changelog` and `latest`
    INPUT_TITLE-TEMPLATE          Title template (GitHub Actions input)
    INPUT_DESCRIPTION-TEMPLATE    Description template (GitHub Actions input)
    INPUT_TOKEN                   Token passed to gh as GH_TOKEN (GitHub Actions input)
";

/// Build a changelog from a repository's releases.
#[derive(Parser)]
#[command(name = "relnotes")]
#[command(about = "Build a changelog and find the latest tag from a repository's releases", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Flags accepted by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags shared by all subcommands.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Config file layered over the discovered ones
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// When to colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Build the changelog and find the latest release tag
    Build(commands::build::BuildArgs),

    /// Diagnose configuration and environment
    Doctor(commands::doctor::DoctorArgs),

    /// Show package and configuration information
    Info(commands::info::InfoArgs),
}

/// The clap command tree, for man pages and completions.
pub fn command() -> clap::Command {
    Cli::command()
}
