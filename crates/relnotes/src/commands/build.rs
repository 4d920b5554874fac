//! Build command: thin CLI layer over `relnotes_core::changelog`.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, info, instrument, warn};

use relnotes_core::changelog::{ChangelogBuilder, FragmentPolicy};
use relnotes_core::config::Config;
use relnotes_core::output;
use relnotes_core::source::{FileSource, GhSource, ReleaseSource};
use relnotes_core::template::Templates;

/// Arguments for the `build` subcommand.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Read the release listing from a JSON file ("-" for stdin) instead of `gh`
    #[arg(long, value_name = "FILE", conflicts_with = "repo")]
    pub releases: Option<Utf8PathBuf>,

    /// Repository to list releases for (default: $GITHUB_REPOSITORY, then origin)
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Template for each release title; %%TITLE%% is replaced
    #[arg(long, value_name = "TEMPLATE", env = "INPUT_TITLE-TEMPLATE")]
    pub title_template: Option<String>,

    /// Template for each release body; %%DESCRIPTION%% is replaced
    #[arg(long, value_name = "TEMPLATE", env = "INPUT_DESCRIPTION-TEMPLATE")]
    pub description_template: Option<String>,

    /// How empty titles and descriptions are joined
    #[arg(long, value_enum, value_name = "POLICY")]
    pub fragments: Option<FragmentPolicy>,

    /// Token `gh` authenticates with (default: its own login or $GH_TOKEN)
    #[arg(long, value_name = "TOKEN", env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Append `changelog` and `latest` step outputs to FILE
    #[arg(long, value_name = "FILE", env = output::GITHUB_OUTPUT_ENV)]
    pub github_output: Option<Utf8PathBuf>,
}

impl BuildArgs {
    /// Merge template flags over the configured templates.
    fn templates(&self, config: &Config) -> Templates {
        let configured = config.templates();
        Templates {
            title: self.title_template.clone().unwrap_or(configured.title),
            description: self
                .description_template
                .clone()
                .unwrap_or(configured.description),
        }
    }

    fn source(&self, config: &Config) -> anyhow::Result<Box<dyn ReleaseSource>> {
        if let Some(ref path) = self.releases {
            return Ok(Box::new(FileSource::new(path)));
        }
        Ok(Box::new(self.gh_source(config)?))
    }

    fn gh_source(&self, config: &Config) -> anyhow::Result<GhSource> {
        let repo = self.repo.as_deref().or_else(|| config.repository());
        Ok(GhSource::resolve(repo)?.with_token(self.token.clone()))
    }
}

/// Execute the build command.
#[instrument(name = "cmd_build", skip_all)]
pub fn cmd_build(args: BuildArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let templates = args.templates(config);
    for key in templates.missing_placeholders() {
        warn!(%key, placeholder = key.placeholder(), "template has no placeholder");
    }
    let policy = args.fragments.unwrap_or(config.fragments);
    debug!(?templates, policy = policy.as_str(), "resolved build settings");

    let source = args.source(config)?;
    let described = source.describe();
    info!(source = %described, "started retrieving releases");

    let spinner = super::spinner(&format!("Reading {described}..."));
    let listing = source.fetch();
    spinner.finish_and_clear();
    let listing = listing.with_context(|| format!("failed to read releases from {described}"))?;

    let result = ChangelogBuilder::new(&templates)
        .with_policy(policy)
        .build_from_json(&listing)
        .context("failed to build changelog")?;

    if let Some(ref path) = args.github_output {
        output::write_github_output(path, &result)?;
        info!(%path, "wrote step outputs");
    }

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.changelog.is_empty() {
            println!("{}", result.changelog);
        }
        match result.latest {
            Some(ref tag) => eprintln!("{} {}", "latest:".dimmed(), tag.green()),
            None => eprintln!("{}", "no published releases".yellow()),
        }
    }

    info!(latest = result.latest.as_deref(), "changelog ready");
    Ok(())
}
