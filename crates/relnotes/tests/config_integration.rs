//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RELEASES: &str = r#"[
  {"tagName": "v1", "isDraft": false, "publishedAt": "2024-01-01T00:00:00Z", "name": "First", "body": "Initial"}
]"#;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("GITHUB_OUTPUT")
        .env_remove("GITHUB_REPOSITORY")
        .env_remove("INPUT_TITLE-TEMPLATE")
        .env_remove("INPUT_DESCRIPTION-TEMPLATE");
    cmd
}

/// Run `info --json` from `dir` and return the `config` section.
fn effective_config(dir: &Path) -> serde_json::Value {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "info failed: {output:?}");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["config"].clone()
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = effective_config(tmp.path());
    assert!(config["config_file"].is_null());
    assert_eq!(config["log_level"], "info");
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();

    let config = effective_config(tmp.path());
    assert_eq!(config["log_level"], "debug");
    assert!(
        config["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".relnotes.toml")
    );
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join("relnotes.toml"), r#"log_level = "warn""#).unwrap();

    assert_eq!(effective_config(&sub_dir)["log_level"], "warn");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();
    fs::write(tmp.path().join("relnotes.toml"), r#"log_level = "error""#).unwrap();

    assert_eq!(effective_config(tmp.path())["log_level"], "debug");
}

#[test]
fn explicit_config_flag_overrides_discovery() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();
    let explicit = tmp.path().join("ci.yaml");
    fs::write(&explicit, "fragments: keep-empty\n").unwrap();

    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "--config"])
        .arg(&explicit)
        .args(["info", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config"]["fragments"], "keep-empty");
    assert_eq!(json["config"]["log_level"], "debug");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_toml_templates() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".relnotes.toml"),
        r###"
fragments = "keep-empty"

[templates]
title = "## %%TITLE%%"

[source]
repository = "octo/hello"
"###,
    )
    .unwrap();

    let config = effective_config(tmp.path());
    assert_eq!(config["templates"]["title"], "## %%TITLE%%");
    assert_eq!(config["templates"]["description"], "%%DESCRIPTION%%");
    assert_eq!(config["fragments"], "keep-empty");
    assert_eq!(config["repository"], "octo/hello");
}

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".relnotes.yaml"),
        "templates:\n  description: \"> %%DESCRIPTION%%\"\n",
    )
    .unwrap();

    assert_eq!(
        effective_config(tmp.path())["templates"]["description"],
        "> %%DESCRIPTION%%"
    );
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.yml"), "log_level: error\n").unwrap();

    assert_eq!(effective_config(tmp.path())["log_level"], "error");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".relnotes.json"),
        r##"{"templates": {"title": "# %%TITLE%%"}}"##,
    )
    .unwrap();

    assert_eq!(
        effective_config(tmp.path())["templates"]["title"],
        "# %%TITLE%%"
    );
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"log_level = "error""#).unwrap();
    fs::write(sub_dir.join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();

    assert_eq!(effective_config(&sub_dir)["log_level"], "debug");
}

#[test]
fn toml_preferred_over_yaml_in_same_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();
    fs::write(tmp.path().join(".relnotes.yaml"), "log_level: error\n").unwrap();

    assert_eq!(effective_config(tmp.path())["log_level"], "debug");
}

// =============================================================================
// Config Drives Build
// =============================================================================

#[test]
fn build_uses_configured_templates() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("releases.json"), RELEASES).unwrap();
    fs::write(
        tmp.path().join(".relnotes.toml"),
        r###"
[templates]
title = "## %%TITLE%%"
description = "%%DESCRIPTION%%"
"###,
    )
    .unwrap();

    cmd()
        .current_dir(tmp.path())
        .env("RELNOTES_LOG_DIR", tmp.path().join("logs"))
        .args(["build", "--releases", "releases.json"])
        .assert()
        .success()
        .stdout("## First\n\nInitial\n");
}

#[test]
fn template_flag_beats_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("releases.json"), RELEASES).unwrap();
    fs::write(
        tmp.path().join(".relnotes.toml"),
        "[templates]\ntitle = \"## %%TITLE%%\"\n",
    )
    .unwrap();

    cmd()
        .current_dir(tmp.path())
        .env("RELNOTES_LOG_DIR", tmp.path().join("logs"))
        .args(["build", "--releases", "releases.json"])
        .args(["--title-template", "* %%TITLE%%"])
        .assert()
        .success()
        .stdout("* First\n\nInitial\n");
}

#[test]
fn configured_log_dir_receives_jsonl() {
    let tmp = TempDir::new().unwrap();
    let log_dir = tmp.path().join("logs");
    fs::write(tmp.path().join("releases.json"), RELEASES).unwrap();
    fs::write(
        tmp.path().join(".relnotes.toml"),
        format!("log_dir = {:?}\n", log_dir.to_str().unwrap()),
    )
    .unwrap();

    cmd()
        .current_dir(tmp.path())
        .env_remove("RELNOTES_LOG_DIR")
        .env_remove("RELNOTES_LOG_PATH")
        .args(["build", "--releases", "releases.json"])
        .assert()
        .success();

    let entries: Vec<_> = fs::read_dir(&log_dir).unwrap().collect();
    assert!(!entries.is_empty(), "expected a log file in {log_dir:?}");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.json"), "{not valid json}").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn invalid_fragment_policy_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".relnotes.toml"), r#"fragments = "sometimes""#).unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".relnotes.toml"),
        "log_level = \"warn\"\nunknown_field = \"ignored\"\n",
    )
    .unwrap();

    assert_eq!(effective_config(tmp.path())["log_level"], "warn");
}

// =============================================================================
// Boundary Marker
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(parent.join(".relnotes.toml"), r#"log_level = "error""#).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let config = effective_config(&src);
    assert!(config["config_file"].is_null());
    assert_eq!(config["log_level"], "info");
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".relnotes.toml"), r#"log_level = "debug""#).unwrap();

    assert_eq!(effective_config(&src)["log_level"], "debug");
}
