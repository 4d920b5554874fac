//! Title and description templates.
//!
//! A template is a plain string with a single placeholder token. The builder
//! looks templates up by [`TemplateKey`] through a [`TemplateProvider`], so
//! callers can hand in a config-backed [`Templates`] value or a map literal.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder replaced by a release's title.
pub const TITLE_PLACEHOLDER: &str = "%%TITLE%%";

/// Placeholder replaced by a release's body.
pub const DESCRIPTION_PLACEHOLDER: &str = "%%DESCRIPTION%%";

/// The two templates a changelog build needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Template for each release title (`"title-template"`).
    Title,
    /// Template for each release body (`"description-template"`).
    Description,
}

impl TemplateKey {
    /// The lookup key as used in CI inputs and map-backed providers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title-template",
            Self::Description => "description-template",
        }
    }

    /// The placeholder token this template is expected to contain.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Title => TITLE_PLACEHOLDER,
            Self::Description => DESCRIPTION_PLACEHOLDER,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a template string by key.
pub trait TemplateProvider {
    /// Return the template for `key`, or `None` if it is not configured.
    fn template(&self, key: TemplateKey) -> Option<&str>;
}

impl<P: TemplateProvider + ?Sized> TemplateProvider for &P {
    fn template(&self, key: TemplateKey) -> Option<&str> {
        (**self).template(key)
    }
}

impl TemplateProvider for HashMap<String, String> {
    fn template(&self, key: TemplateKey) -> Option<&str> {
        self.get(key.as_str()).map(String::as_str)
    }
}

impl TemplateProvider for HashMap<&str, &str> {
    fn template(&self, key: TemplateKey) -> Option<&str> {
        self.get(key.as_str()).copied()
    }
}

impl TemplateProvider for BTreeMap<String, String> {
    fn template(&self, key: TemplateKey) -> Option<&str> {
        self.get(key.as_str()).map(String::as_str)
    }
}

/// A fully resolved pair of templates.
///
/// This is what the CLI builds after merging flags, config, and defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Templates {
    /// Title template, containing [`TITLE_PLACEHOLDER`].
    pub title: String,
    /// Description template, containing [`DESCRIPTION_PLACEHOLDER`].
    pub description: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            title: TITLE_PLACEHOLDER.to_string(),
            description: DESCRIPTION_PLACEHOLDER.to_string(),
        }
    }
}

impl Templates {
    /// Keys whose template does not contain its placeholder.
    ///
    /// Such a template still works (it renders unchanged for every release),
    /// but it is almost always a configuration mistake.
    pub fn missing_placeholders(&self) -> Vec<TemplateKey> {
        [TemplateKey::Title, TemplateKey::Description]
            .into_iter()
            .filter(|key| {
                self.template(*key)
                    .is_some_and(|t| !t.contains(key.placeholder()))
            })
            .collect()
    }
}

impl TemplateProvider for Templates {
    fn template(&self, key: TemplateKey) -> Option<&str> {
        match key {
            TemplateKey::Title => Some(&self.title),
            TemplateKey::Description => Some(&self.description),
        }
    }
}

/// Substitute `replace` for the first occurrence of `find` in `template`.
///
/// A `None` replacement substitutes the empty string. A template without
/// `find` comes back unchanged.
pub fn format(template: &str, find: &str, replace: Option<&str>) -> String {
    template.replacen(find, replace.unwrap_or_default(), 1)
}
