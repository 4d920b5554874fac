//! Writing build results for the surrounding automation.
//!
//! GitHub Actions collects step outputs from the file named by
//! `$GITHUB_OUTPUT`. Values are written in heredoc form so multi-line
//! changelogs survive intact:
//!
//! ```text
//! changelog<<relnotes_EOF
//! ## v1.0.0
//! ...
//! relnotes_EOF
//! ```

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::changelog::Changelog;

/// Environment variable naming the Actions output file.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

const DELIMITER_BASE: &str = "relnotes_EOF";

/// Errors from writing outputs.
#[derive(Error, Debug)]
#[error("failed to write outputs to {path}: {source}")]
pub struct OutputError {
    /// The output file.
    pub path: Utf8PathBuf,
    /// The underlying I/O error.
    pub source: std::io::Error,
}

/// The `$GITHUB_OUTPUT` path, if set and non-empty.
pub fn github_output_path() -> Option<Utf8PathBuf> {
    std::env::var(GITHUB_OUTPUT_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}

/// Render `changelog` and `latest` as Actions output blocks.
///
/// A missing latest tag is written as an empty value.
pub fn render_outputs(result: &Changelog) -> String {
    let mut out = String::new();
    push_output(&mut out, "changelog", &result.changelog);
    push_output(&mut out, "latest", result.latest.as_deref().unwrap_or_default());
    out
}

/// Append [`render_outputs`] to the file at `path`.
///
/// # Errors
///
/// Returns [`OutputError`] if the file cannot be opened or written.
#[instrument(skip(result))]
pub fn write_github_output(path: &Utf8Path, result: &Changelog) -> Result<(), OutputError> {
    let to_err = |source: std::io::Error| OutputError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)?;
    file.write_all(render_outputs(result).as_bytes())
        .map_err(to_err)?;

    debug!(latest = result.latest.as_deref(), "outputs written");
    Ok(())
}

fn push_output(out: &mut String, name: &str, value: &str) {
    let delimiter = delimiter_for(value);
    out.push_str(&format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"));
}

/// A heredoc delimiter that does not occur as a line in `value`.
fn delimiter_for(value: &str) -> String {
    let mut delimiter = DELIMITER_BASE.to_string();
    let mut n = 0u32;
    while value.lines().any(|line| line == delimiter) {
        n += 1;
        delimiter = format!("{DELIMITER_BASE}_{n}");
    }
    delimiter
}
