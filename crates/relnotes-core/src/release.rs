//! Release records as returned by a release listing.
//!
//! Field names follow the GitHub REST API (`tag_name`, `draft`,
//! `published_at`, `name`, `body`). The camelCase names used by GraphQL and
//! `gh release list --json` (`tagName`, `isDraft`, `publishedAt`) are
//! accepted as aliases, along with `title` for the release name.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One release's metadata.
///
/// Every text field is optional; the builder degrades to empty strings
/// rather than failing on a sparse record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseRecord {
    /// The tag the release points at (e.g. `v1.2.3`).
    #[serde(default, alias = "tagName")]
    pub tag_name: Option<String>,

    /// Drafts are excluded from the changelog and never become latest.
    #[serde(default, alias = "isDraft")]
    pub draft: bool,

    /// Raw publish timestamp, parsed on demand by [`Self::published`].
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<String>,

    /// Release title.
    #[serde(default, alias = "title")]
    pub name: Option<String>,

    /// Release body (usually markdown).
    #[serde(default)]
    pub body: Option<String>,
}

impl ReleaseRecord {
    /// Parse [`Self::published_at`].
    ///
    /// Returns `None` when the field is absent or not a recognized timestamp.
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parse a publish timestamp.
///
/// Accepts RFC 3339 (`2013-02-27T19:35:32Z`, `2013-02-27T20:35:32+01:00`)
/// and bare dates (`2013-02-27`, read as midnight UTC). Surrounding
/// whitespace is ignored.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}
