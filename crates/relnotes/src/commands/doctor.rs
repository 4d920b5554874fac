//! Doctor command — diagnose configuration and environment.

use clap::Args;
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use relnotes_core::config::{self, Config, TemplatesConfig};
use relnotes_core::output;
use relnotes_core::source;
use relnotes_core::template::{DESCRIPTION_PLACEHOLDER, TITLE_PLACEHOLDER};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    directories: DirectoryPaths,
    config: ConfigStatus,
    templates: TemplateStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    logs: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Path to the project config file, if any
    file: Option<String>,
    found: bool,
}

#[derive(Serialize)]
struct TemplateStatus {
    /// Template keys whose template lacks its placeholder token
    missing_placeholders: Vec<String>,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    cwd: String,
    /// Whether the `gh` CLI is on PATH (needed unless --releases is used)
    gh_available: bool,
    /// Whether `build` will write step outputs
    github_output: Option<String>,
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    /// Whether the variable is set. Values are not reported.
    set: bool,
    description: &'static str,
}

impl EnvVar {
    fn probe(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            set: std::env::var_os(name).is_some(),
            description,
        }
    }
}

impl DoctorReport {
    fn gather(config: &Config, cwd: &camino::Utf8Path) -> Self {
        let config_file = config::find_project_config(cwd);
        let missing_placeholders = config
            .templates()
            .missing_placeholders()
            .into_iter()
            .map(|key| key.to_string())
            .collect();

        Self {
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                logs: config::user_data_local_dir().map(|p| p.join("logs").to_string()),
            },
            config: ConfigStatus {
                found: config_file.is_some(),
                file: config_file.map(|p| p.to_string()),
            },
            templates: TemplateStatus {
                missing_placeholders,
            },
            environment: EnvironmentInfo {
                cwd: cwd.to_string(),
                gh_available: source::has_gh(),
                github_output: output::github_output_path().map(|p| p.to_string()),
                env_vars: vec![
                    EnvVar::probe("GITHUB_REPOSITORY", "Default repository for build"),
                    EnvVar::probe("GH_TOKEN", "Token used by gh"),
                    EnvVar::probe("INPUT_TOKEN", "Action token passed to gh"),
                    EnvVar::probe("XDG_CONFIG_HOME", "Override config directory"),
                    EnvVar::probe("RUST_LOG", "Log filter directive"),
                    EnvVar::probe("RELNOTES_LOG_DIR", "Log directory override"),
                    EnvVar::probe("RELNOTES_LOG_PATH", "Log file override"),
                ],
            },
        }
    }
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = super::spinner("Gathering diagnostics...");
    let report = DoctorReport::gather(config, cwd);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    match report.config.file {
        Some(ref file) => println!("  {} Config file: {}", "✓".green(), file.cyan()),
        None => {
            println!("  {} No config file found", "○".yellow());
            offer_config_creation()?;
        }
    }
    if report.templates.missing_placeholders.is_empty() {
        println!("  {} Templates contain their placeholders", "✓".green());
    } else {
        for key in &report.templates.missing_placeholders {
            println!("  {} {} has no placeholder", "✗".red(), key.yellow());
        }
    }
    println!();

    println!("{}", "Directories".bold().underline());
    print_dir("  Config", report.directories.config.as_deref());
    print_dir("  Logs", report.directories.logs.as_deref());
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), report.environment.cwd.cyan());
    if report.environment.gh_available {
        println!("  {} gh CLI found", "✓".green());
    } else {
        println!(
            "  {} gh CLI not found (use --releases FILE instead)",
            "○".yellow()
        );
    }
    match report.environment.github_output {
        Some(ref path) => println!("  {}: {}", "Step outputs".dimmed(), path.cyan()),
        None => println!("  {} GITHUB_OUTPUT not set", "○".dimmed()),
    }
    for var in report.environment.env_vars.iter().filter(|v| v.set) {
        println!("  {}: {}", var.name.dimmed(), "set".cyan());
    }

    Ok(())
}

fn print_dir(label: &str, path: Option<&str>) {
    print!("{}: ", label.dimmed());
    match path {
        Some(p) => println!("{}", p.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
}

/// Offer to create a starter user config when none exists.
fn offer_config_creation() -> anyhow::Result<()> {
    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };
    let config_path = config_dir.join("config.yaml");

    if config_path.exists() || !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a starter config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    // Declined or interrupted: nothing to do.
    if !matches!(create, Ok(true)) {
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let yaml = serde_saphyr::to_string(&starter_config())?;
    std::fs::write(&config_path, yaml)?;
    println!("  {} Created {}", "✓".green(), config_path.cyan());

    Ok(())
}

fn starter_config() -> Config {
    Config {
        templates: Some(TemplatesConfig {
            title: Some(TITLE_PLACEHOLDER.to_string()),
            description: Some(DESCRIPTION_PLACEHOLDER.to_string()),
        }),
        ..Config::default()
    }
}
