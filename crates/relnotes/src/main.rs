//! relnotes CLI
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use relnotes::{Cli, Commands, GlobalArgs, commands};
use relnotes_core::config::{Config, ConfigLoader};
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let Cli { command, global } = Cli::parse();
    global.color.apply();

    let cwd = working_dir(&global)?;
    let config = load_config(&global, &cwd)?;

    let log_dir = config.log_dir.as_ref().map(|dir| dir.as_std_path().to_path_buf());
    let filter = observability::env_filter(global.quiet, global.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(
        &observability::ObservabilityConfig::new(log_dir),
        filter,
    )
    .context("failed to initialize logging")?;

    debug!(?global, %cwd, "CLI initialized");

    let json = global.json;
    let result = match command {
        Commands::Build(args) => commands::build::cmd_build(args, json, &config),
        Commands::Doctor(args) => commands::doctor::cmd_doctor(args, json, &config, &cwd),
        Commands::Info(args) => commands::info::cmd_info(args, json, &config, &cwd),
    };
    if let Err(ref err) = result {
        tracing::error!(error = format!("{err:#}"), "fatal error");
    }
    result
}

/// Apply `-C` and return the resulting working directory.
fn working_dir(global: &GlobalArgs) -> anyhow::Result<Utf8PathBuf> {
    if let Some(ref dir) = global.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    utf8(cwd, "current directory")
}

/// Discovered config files, with `--config` layered on top.
fn load_config(global: &GlobalArgs, cwd: &Utf8Path) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new().with_project_search(cwd);
    if let Some(ref path) = global.config {
        loader = loader.with_file(utf8(path.clone(), "config path")?);
    }
    loader.load().context("failed to load configuration")
}

fn utf8(path: PathBuf, what: &str) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path)
        .map_err(|e| anyhow!("{what} is not valid UTF-8: {}", e.into_path_buf().display()))
}
