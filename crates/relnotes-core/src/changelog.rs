//! Changelog and latest-tag computation.
//!
//! The builder walks releases in input order:
//! 1. Drafts are skipped outright.
//! 2. Each remaining release competes for "latest" by publish time.
//! 3. Its title and body are run through the title/description templates.
//! 4. The formatted pieces are joined with a blank line.
//!
//! Nothing here touches the network, the filesystem, or the environment.
//! The same input always yields the same [`Changelog`].
//!
//! # Example
//!
//! ```
//! use relnotes_core::changelog::ChangelogBuilder;
//! use relnotes_core::release::ReleaseRecord;
//! use relnotes_core::template::Templates;
//!
//! let releases = vec![ReleaseRecord {
//!     tag_name: Some("v1".into()),
//!     published_at: Some("2013-02-27T19:35:32Z".into()),
//!     name: Some("title v1".into()),
//!     body: Some("description v1".into()),
//!     ..Default::default()
//! }];
//!
//! let result = ChangelogBuilder::new(Templates::default())
//!     .build(&releases)
//!     .unwrap();
//!
//! assert_eq!(result.changelog, "title v1\n\ndescription v1");
//! assert_eq!(result.latest.as_deref(), Some("v1"));
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ChangelogError, ChangelogResult};
use crate::release::ReleaseRecord;
use crate::template::{self, TemplateKey, TemplateProvider};

/// Separator between a title and its description, and between releases.
pub const SEPARATOR: &str = "\n\n";

/// How empty title or description text is joined.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentPolicy {
    /// Drop empty pieces before joining; a release that renders to nothing
    /// is left out of the changelog.
    #[default]
    SkipEmpty,
    /// Always join title and description, so an empty piece still leaves
    /// its separator behind.
    KeepEmpty,
}

impl FragmentPolicy {
    /// Returns the policy name as used in config files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SkipEmpty => "skip-empty",
            Self::KeepEmpty => "keep-empty",
        }
    }
}

/// The two outputs of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changelog {
    /// Formatted releases joined with [`SEPARATOR`].
    pub changelog: String,
    /// Tag of the newest non-draft release, if any survived filtering.
    pub latest: Option<String>,
}

/// Best candidate for "latest" seen so far.
#[derive(Debug, Default)]
struct LatestTracker {
    seen: bool,
    tag: Option<String>,
    published: Option<DateTime<FixedOffset>>,
}

impl LatestTracker {
    /// Consider `release` as the new latest.
    ///
    /// An empty tracker takes whatever comes first. After that only a
    /// strictly newer publish time wins, so ties keep the earlier release.
    /// An unparsable time never compares greater or smaller: it is kept when
    /// it arrives first and never displaces anything later.
    fn observe(&mut self, release: &ReleaseRecord) {
        let published = release.published();
        let newer = match (published, self.published) {
            _ if !self.seen => true,
            (Some(candidate), Some(current)) => candidate > current,
            _ => false,
        };

        if newer {
            self.seen = true;
            self.tag = release.tag_name.clone();
            self.published = published;
        }
    }
}

/// Builds a [`Changelog`] from release records.
#[derive(Debug, Clone)]
pub struct ChangelogBuilder<P> {
    templates: P,
    policy: FragmentPolicy,
}

impl<P: TemplateProvider> ChangelogBuilder<P> {
    /// Create a builder using `templates` and the default [`FragmentPolicy`].
    pub fn new(templates: P) -> Self {
        Self {
            templates,
            policy: FragmentPolicy::default(),
        }
    }

    /// Set how empty titles and descriptions are joined.
    pub const fn with_policy(mut self, policy: FragmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the changelog from a JSON release listing.
    ///
    /// # Errors
    ///
    /// Returns [`ChangelogError::InvalidInput`] if `value` is not an array,
    /// [`ChangelogError::InvalidRecord`] if an element is not shaped like a
    /// release, and [`ChangelogError::MissingTemplate`] if a template is not
    /// configured.
    pub fn build_from_json(&self, value: &serde_json::Value) -> ChangelogResult<Changelog> {
        let Some(items) = value.as_array() else {
            return Err(ChangelogError::InvalidInput {
                received: json_type_name(value),
            });
        };

        let releases = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ReleaseRecord::deserialize(item)
                    .map_err(|source| ChangelogError::InvalidRecord { index, source })
            })
            .collect::<ChangelogResult<Vec<_>>>()?;

        self.build(&releases)
    }

    /// Build the changelog from release records.
    ///
    /// # Errors
    ///
    /// Returns [`ChangelogError::MissingTemplate`] if either template is not
    /// available from the provider.
    #[instrument(name = "build_changelog", skip_all, fields(policy = self.policy.as_str()))]
    pub fn build<'a, I>(&self, releases: I) -> ChangelogResult<Changelog>
    where
        I: IntoIterator<Item = &'a ReleaseRecord>,
    {
        let title_template = self.lookup(TemplateKey::Title)?;
        let description_template = self.lookup(TemplateKey::Description)?;

        let mut latest = LatestTracker::default();
        let mut fragments = Vec::new();

        for release in releases {
            if release.draft {
                debug!(
                    name = release.name.as_deref().unwrap_or_default(),
                    "skipping draft"
                );
                continue;
            }

            latest.observe(release);

            let title = template::format(
                title_template,
                TemplateKey::Title.placeholder(),
                release.name.as_deref(),
            );
            let description = template::format(
                description_template,
                TemplateKey::Description.placeholder(),
                release.body.as_deref(),
            );

            let fragment = self.join_fragment(title, description);
            if self.policy == FragmentPolicy::SkipEmpty && fragment.is_empty() {
                continue;
            }
            fragments.push(fragment);
        }

        debug!(
            releases = fragments.len(),
            latest = latest.tag.as_deref(),
            "changelog built"
        );

        Ok(Changelog {
            changelog: fragments.join(SEPARATOR),
            latest: latest.tag,
        })
    }

    fn lookup(&self, key: TemplateKey) -> ChangelogResult<&str> {
        self.templates
            .template(key)
            .ok_or(ChangelogError::MissingTemplate { key })
    }

    fn join_fragment(&self, title: String, description: String) -> String {
        match self.policy {
            FragmentPolicy::KeepEmpty => [title, description].join(SEPARATOR),
            FragmentPolicy::SkipEmpty => [title, description]
                .into_iter()
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(SEPARATOR),
        }
    }
}

/// Build a changelog with the default [`FragmentPolicy`].
///
/// Shorthand for `ChangelogBuilder::new(templates).build(releases)`.
///
/// # Errors
///
/// See [`ChangelogBuilder::build`].
pub fn build<'a, I, P>(releases: I, templates: P) -> ChangelogResult<Changelog>
where
    I: IntoIterator<Item = &'a ReleaseRecord>,
    P: TemplateProvider,
{
    ChangelogBuilder::new(templates).build(releases)
}

const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::template::Templates;

    fn release(tag: &str, draft: bool, published_at: &str) -> ReleaseRecord {
        let n = tag.trim_start_matches('v');
        ReleaseRecord {
            tag_name: Some(tag.to_string()),
            draft,
            published_at: Some(published_at.to_string()),
            name: Some(format!("title v{n}")),
            body: Some(format!("description v{n}")),
        }
    }

    fn v0() -> ReleaseRecord {
        release("v0", true, "2012-02-27T19:35:32Z")
    }

    fn v1() -> ReleaseRecord {
        release("v1", false, "2013-02-27T19:35:32Z")
    }

    fn v2() -> ReleaseRecord {
        release("v2", false, "2014-02-27T19:35:32Z")
    }

    fn templates() -> HashMap<String, String> {
        HashMap::from([
            ("title-template".to_string(), "%%TITLE%%".to_string()),
            (
                "description-template".to_string(),
                "%%DESCRIPTION%%".to_string(),
            ),
        ])
    }

    fn run(releases: &[ReleaseRecord]) -> Changelog {
        build(releases, templates()).unwrap()
    }

    fn run_keep_empty(releases: &[ReleaseRecord]) -> Changelog {
        ChangelogBuilder::new(templates())
            .with_policy(FragmentPolicy::KeepEmpty)
            .build(releases)
            .unwrap()
    }

    #[test]
    fn one_valid_entry() {
        let result = run(&[v1()]);
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
    }

    #[test]
    fn two_valid_entries() {
        let result = run(&[v1(), v2()]);
        assert_eq!(result.latest.as_deref(), Some("v2"));
        assert_eq!(
            result.changelog,
            "title v1\n\ndescription v1\n\ntitle v2\n\ndescription v2"
        );
    }

    #[test]
    fn draft_is_excluded() {
        let result = run(&[v0(), v1(), v2()]);
        assert_eq!(result.latest.as_deref(), Some("v2"));
        assert_eq!(
            result.changelog,
            "title v1\n\ndescription v1\n\ntitle v2\n\ndescription v2"
        );
    }

    #[test]
    fn newest_draft_never_becomes_latest() {
        let draft = release("v9", true, "2030-01-01T00:00:00Z");
        let result = run(&[v1(), draft]);
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert!(!result.changelog.contains("v9"));
    }

    #[test]
    fn latest_follows_time_not_order() {
        let result = run(&[v2(), v1()]);
        assert_eq!(result.latest.as_deref(), Some("v2"));
        assert!(result.changelog.starts_with("title v2"));
    }

    #[test]
    fn tie_keeps_first_seen() {
        let a = release("va", false, "2014-02-27T19:35:32Z");
        let b = release("vb", false, "2014-02-27T19:35:32Z");
        assert_eq!(run(&[a.clone(), b.clone()]).latest.as_deref(), Some("va"));
        assert_eq!(run(&[b, a]).latest.as_deref(), Some("vb"));
    }

    #[test]
    fn tie_across_offsets_keeps_first_seen() {
        let a = release("va", false, "2014-02-27T19:35:32Z");
        let b = release("vb", false, "2014-02-27T20:35:32+01:00");
        assert_eq!(run(&[a, b]).latest.as_deref(), Some("va"));
    }

    #[test]
    fn empty_input() {
        let result = run(&[]);
        assert_eq!(result, Changelog::default());
        assert!(result.latest.is_none());
    }

    #[test]
    fn all_drafts() {
        let result = run(&[v0(), release("v3", true, "2015-01-01T00:00:00Z")]);
        assert_eq!(result.changelog, "");
        assert!(result.latest.is_none());
    }

    #[test]
    fn invalid_date_first_entry_is_accepted() {
        let mut actual = v1();
        actual.published_at = Some("foobar".into());
        let result = run(&[actual]);
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
    }

    #[test]
    fn invalid_date_never_replaces_valid_latest() {
        let mut broken = v2();
        broken.published_at = Some("foobar".into());
        assert_eq!(run(&[v1(), broken]).latest.as_deref(), Some("v1"));
    }

    #[test]
    fn invalid_first_entry_stays_latest() {
        let mut broken = v2();
        broken.published_at = Some("foobar".into());
        let result = run(&[broken, v1()]);
        assert_eq!(result.latest.as_deref(), Some("v2"));
        assert_eq!(
            result.changelog,
            "title v2\n\ndescription v2\n\ntitle v1\n\ndescription v1"
        );
    }

    #[test]
    fn missing_first_date_stays_latest() {
        let mut undated = v1();
        undated.published_at = None;
        assert_eq!(run(&[undated, v2()]).latest.as_deref(), Some("v1"));
    }

    #[test]
    fn two_invalid_dates_keep_first() {
        let mut a = v1();
        a.published_at = None;
        let mut b = v2();
        b.published_at = Some("nope".into());
        assert_eq!(run(&[a, b]).latest.as_deref(), Some("v1"));
    }

    #[test]
    fn missing_published_at_is_accepted_when_alone() {
        let mut actual = v1();
        actual.published_at = None;
        let result = run(&[actual]);
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
    }

    #[test]
    fn missing_tag_name_yields_no_latest() {
        let mut actual = v1();
        actual.tag_name = None;
        let result = run(&[actual]);
        assert!(result.latest.is_none());
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
    }

    #[test]
    fn missing_name_skip_empty() {
        let mut actual = v1();
        actual.name = None;
        let result = run(&[actual]);
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert_eq!(result.changelog, "description v1");
    }

    #[test]
    fn missing_name_keep_empty() {
        let mut actual = v1();
        actual.name = None;
        let result = run_keep_empty(&[actual]);
        assert_eq!(result.changelog, "\n\ndescription v1");
    }

    #[test]
    fn missing_body_skip_empty() {
        let mut actual = v1();
        actual.body = None;
        assert_eq!(run(&[actual]).changelog, "title v1");
    }

    #[test]
    fn missing_body_keep_empty() {
        let mut actual = v1();
        actual.body = None;
        assert_eq!(run_keep_empty(&[actual]).changelog, "title v1\n\n");
    }

    #[test]
    fn blank_release_is_dropped_under_skip_empty() {
        let blank = ReleaseRecord {
            tag_name: Some("v3".into()),
            published_at: Some("2020-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        let result = run(&[v1(), blank.clone()]);
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
        // Still eligible for latest even though it rendered to nothing.
        assert_eq!(result.latest.as_deref(), Some("v3"));

        let kept = run_keep_empty(&[v1(), blank]);
        assert_eq!(kept.changelog, "title v1\n\ndescription v1\n\n\n\n");
    }

    #[test]
    fn templates_are_applied() {
        let templates = Templates {
            title: "# %%TITLE%%".into(),
            description: "> %%DESCRIPTION%%".into(),
        };
        let mut fix = v1();
        fix.name = Some("Fix bug".into());
        let result = build(&[fix], &templates).unwrap();
        assert_eq!(result.changelog, "# Fix bug\n\n> description v1");
    }

    #[test]
    fn template_prefix_survives_missing_title() {
        let templates = Templates {
            title: "# %%TITLE%%".into(),
            description: "%%DESCRIPTION%%".into(),
        };
        let mut actual = v1();
        actual.name = None;
        let result = build(&[actual], &templates).unwrap();
        assert_eq!(result.changelog, "# \n\ndescription v1");
    }

    #[test]
    fn missing_template_is_an_error() {
        let partial = HashMap::from([("title-template".to_string(), "%%TITLE%%".to_string())]);
        let err = build(&[v1()], partial).unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::MissingTemplate {
                key: TemplateKey::Description
            }
        ));
        assert_eq!(
            err.to_string(),
            "no template configured for \"description-template\""
        );
    }

    #[test]
    fn build_is_idempotent() {
        let releases = [v0(), v2(), v1()];
        assert_eq!(run(&releases), run(&releases));
    }

    #[test]
    fn json_array_is_accepted() {
        let value = json!([
            {
                "draft": true,
                "published_at": "2012-02-27T19:35:32Z",
                "tag_name": "v0",
                "name": "title v0",
                "body": "description v0"
            },
            {
                "draft": false,
                "published_at": "2013-02-27T19:35:32Z",
                "tag_name": "v1",
                "name": "title v1",
                "body": "description v1"
            }
        ]);
        let result = ChangelogBuilder::new(templates())
            .build_from_json(&value)
            .unwrap();
        assert_eq!(result.latest.as_deref(), Some("v1"));
        assert_eq!(result.changelog, "title v1\n\ndescription v1");
    }

    #[test]
    fn json_object_is_rejected_with_type() {
        let value = json!({"tag_name": "v1"});
        let err = ChangelogBuilder::new(templates())
            .build_from_json(&value)
            .unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::InvalidInput { received: "object" }
        ));
        assert_eq!(
            err.to_string(),
            "Expected an array back as response, but got \"object\""
        );
    }

    #[test]
    fn json_scalars_are_rejected_with_type() {
        let builder = ChangelogBuilder::new(templates());
        for (value, expected) in [
            (json!(null), "null"),
            (json!("releases"), "string"),
            (json!(3), "number"),
            (json!(true), "boolean"),
        ] {
            match builder.build_from_json(&value) {
                Err(ChangelogError::InvalidInput { received }) => assert_eq!(received, expected),
                other => panic!("expected InvalidInput for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    fn json_malformed_record_reports_index() {
        let value = json!([{"tag_name": "v1"}, {"tag_name": 7}]);
        let err = ChangelogBuilder::new(templates())
            .build_from_json(&value)
            .unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn fragment_policy_names() {
        assert_eq!(FragmentPolicy::SkipEmpty.as_str(), "skip-empty");
        assert_eq!(FragmentPolicy::KeepEmpty.as_str(), "keep-empty");
        assert_eq!(FragmentPolicy::default(), FragmentPolicy::SkipEmpty);
        let json = serde_json::to_string(&FragmentPolicy::KeepEmpty).unwrap();
        assert_eq!(json, "\"keep-empty\"");
    }

    #[test]
    fn changelog_serializes_null_latest() {
        let json = serde_json::to_string(&Changelog::default()).unwrap();
        assert_eq!(json, r#"{"changelog":"","latest":null}"#);
    }
}
