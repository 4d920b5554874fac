//! Error types for relnotes-core

use thiserror::Error;

use crate::template::TemplateKey;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a changelog build.
///
/// Malformed fields inside a release (missing title, unparsable date) are
/// not errors; only the shape of the input and the template lookup can fail.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// The release list was not a collection.
    #[error("Expected an array back as response, but got \"{received}\"")]
    InvalidInput {
        /// The type name of the value that was received instead.
        received: &'static str,
    },

    /// An element of the release list could not be read as a release.
    #[error("release #{index} is malformed: {source}")]
    InvalidRecord {
        /// Zero-based position of the element in the input.
        index: usize,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// The template provider has no template for a required key.
    #[error("no template configured for \"{key}\"")]
    MissingTemplate {
        /// The key that was looked up.
        key: TemplateKey,
    },
}

/// Result type alias using [`ChangelogError`].
pub type ChangelogResult<T> = Result<T, ChangelogError>;
