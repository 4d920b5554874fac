//! Where release listings come from.
//!
//! A [`ReleaseSource`] hands back the raw JSON listing; the builder decides
//! whether it is usable. Two sources exist:
//!
//! - [`FileSource`] reads a JSON file, or stdin for `-`.
//! - [`GhSource`] shells out to `gh api`, which owns authentication and
//!   pagination. This inherits whatever `gh auth` or `GH_TOKEN` the user
//!   already has.

use std::io::Read;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from reading a release listing.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to spawn an external command.
    #[error("failed to run {program}: {source}")]
    Exec {
        /// The program that could not be started.
        program: &'static str,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An external command exited non-zero.
    #[error("{program} {command} failed: {stderr}")]
    Command {
        /// The program that failed.
        program: &'static str,
        /// The subcommand that failed (e.g., "api").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Failed to read the listing from disk or stdin.
    #[error("failed to read releases from {path}: {source}")]
    Read {
        /// The path that was read (`-` for stdin).
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The listing was not valid JSON.
    #[error("release listing is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No repository was given and none could be detected.
    #[error("could not determine the repository; pass --repo owner/name")]
    UnknownRepository,
}

/// Result alias for release sources.
pub type SourceResult<T> = Result<T, SourceError>;

/// Supplies a release listing as JSON.
pub trait ReleaseSource {
    /// Fetch the listing. The value is normally an array of release objects.
    fn fetch(&self) -> SourceResult<Value>;

    /// Human-readable description of where releases come from.
    fn describe(&self) -> String;
}

/// Reads a release listing from a JSON file, or stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Utf8PathBuf,
}

impl FileSource {
    /// Create a source for `path`.
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_str() == "-"
    }
}

impl ReleaseSource for FileSource {
    #[instrument(skip(self), fields(path = %self.path))]
    fn fetch(&self) -> SourceResult<Value> {
        let read_err = |source: std::io::Error| SourceError::Read {
            path: self.path.clone(),
            source,
        };

        let raw = if self.is_stdin() {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(read_err)?;
            buf
        } else {
            std::fs::read_to_string(&self.path).map_err(read_err)?
        };

        debug!(bytes = raw.len(), "read release listing");
        parse_listing(&raw)
    }

    fn describe(&self) -> String {
        if self.is_stdin() {
            "stdin".to_string()
        } else {
            self.path.to_string()
        }
    }
}

/// Environment variable `gh` reads its token from.
pub const GH_TOKEN_ENV: &str = "GH_TOKEN";

/// Lists releases through `gh api --paginate`.
#[derive(Clone)]
pub struct GhSource {
    repo: String,
    token: Option<String>,
}

impl std::fmt::Debug for GhSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhSource")
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GhSource {
    /// Create a source for `owner/repo`.
    pub fn new<S: Into<String>>(repo: S) -> Self {
        Self {
            repo: repo.into(),
            token: None,
        }
    }

    /// Authenticate `gh` with `token` instead of its ambient login.
    ///
    /// Blank tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Whether an explicit token will be passed to `gh`.
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn api_command(&self) -> Command {
        let mut cmd = Command::new("gh");
        cmd.args(["api", "--paginate", "-H", "Accept: application/vnd.github+json"])
            .arg(format!("repos/{}/releases", self.repo));
        if let Some(ref token) = self.token {
            cmd.env(GH_TOKEN_ENV, token);
        }
        cmd
    }

    /// Resolve the repository from, in order: `explicit`,
    /// `$GITHUB_REPOSITORY`, and the `origin` remote of the current checkout.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownRepository`] when none of them yield
    /// an `owner/repo` pair.
    pub fn resolve(explicit: Option<&str>) -> SourceResult<Self> {
        let from_env = std::env::var("GITHUB_REPOSITORY")
            .ok()
            .filter(|repo| !repo.trim().is_empty());

        explicit
            .map(str::to_string)
            .or(from_env)
            .or_else(origin_repository)
            .map(Self::new)
            .ok_or(SourceError::UnknownRepository)
    }

    /// The `owner/repo` this source lists.
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl ReleaseSource for GhSource {
    #[instrument(skip(self), fields(repo = %self.repo, token = self.has_token()))]
    fn fetch(&self) -> SourceResult<Value> {
        let stdout = output_of("gh", "api", self.api_command())?;
        debug!(bytes = stdout.len(), "fetched release listing");
        parse_listing(&stdout)
    }

    fn describe(&self) -> String {
        format!("GitHub releases of {}", self.repo)
    }
}

/// Whether the `gh` CLI is on `PATH`.
pub fn has_gh() -> bool {
    which::which("gh").is_ok()
}

/// Parse a listing that may consist of several concatenated JSON documents.
///
/// `gh api --paginate` prints one array per page back to back. Arrays are
/// flattened into one; a single non-array document is returned as-is so the
/// builder can report what it got.
pub fn parse_listing(raw: &str) -> SourceResult<Value> {
    let mut pages = serde_json::Deserializer::from_str(raw)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()?;

    if pages.len() == 1 {
        return Ok(pages.remove(0));
    }

    let mut releases = Vec::new();
    for page in pages {
        match page {
            Value::Array(items) => releases.extend(items),
            other => return Ok(other),
        }
    }
    Ok(Value::Array(releases))
}

/// `owner/repo` of the `origin` remote, if the current directory is a
/// GitHub checkout.
fn origin_repository() -> Option<String> {
    let url = run("git", &["remote", "get-url", "origin"]).ok()?;
    let (owner, repo) = parse_owner_repo(url.trim())?;
    debug!(%owner, %repo, "repository from origin remote");
    Some(format!("{owner}/{repo}"))
}

/// Split a git remote URL into owner and repository.
///
/// Handles `https://host/owner/repo(.git)` and `git@host:owner/repo(.git)`.
pub fn parse_owner_repo(url: &str) -> Option<(String, String)> {
    let path = match url.strip_prefix("git@") {
        Some(ssh) => ssh.split_once(':')?.1,
        None => url.split_once("://")?.1.split_once('/')?.1,
    };
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    match path.split('/').collect::<Vec<_>>()[..] {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Some((owner.to_string(), repo.to_string()))
        }
        _ => None,
    }
}

/// Run `program` with `args`, returning stdout.
fn run(program: &'static str, args: &[&str]) -> SourceResult<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    output_of(program, args.first().copied().unwrap_or_default(), cmd)
}

/// Run a prepared command, returning stdout or its stderr as an error.
fn output_of(program: &'static str, command: &str, mut cmd: Command) -> SourceResult<String> {
    let output = cmd
        .output()
        .map_err(|source| SourceError::Exec { program, source })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(SourceError::Command {
            program,
            command: command.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
