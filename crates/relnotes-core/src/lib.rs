//! Core library for relnotes.
//!
//! Turns a repository's release listing into a single changelog document
//! and picks the latest published tag. The `relnotes` CLI is a thin layer
//! over this crate.
//!
//! # Modules
//!
//! - [`changelog`] - The changelog builder and latest-tag selection
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`output`] - Writing results as CI step outputs
//! - [`release`] - Release records and publish-time parsing
//! - [`source`] - Reading release listings from files or `gh`
//! - [`template`] - Title/description templates
//!
//! # Quick Start
//!
//! ```
//! use relnotes_core::changelog::ChangelogBuilder;
//! use relnotes_core::template::Templates;
//!
//! let listing = serde_json::json!([
//!     {"tag_name": "v1", "draft": false, "published_at": "2013-02-27T19:35:32Z",
//!      "name": "title v1", "body": "description v1"},
//!     {"tag_name": "v2", "draft": false, "published_at": "2014-02-27T19:35:32Z",
//!      "name": "title v2", "body": "description v2"},
//! ]);
//!
//! let result = ChangelogBuilder::new(Templates::default())
//!     .build_from_json(&listing)
//!     .unwrap();
//!
//! assert_eq!(result.latest.as_deref(), Some("v2"));
//! ```
#![deny(unsafe_code)]

pub mod changelog;

pub mod config;

pub mod error;

pub mod output;

pub mod release;

pub mod source;

pub mod template;

pub use changelog::{Changelog, ChangelogBuilder, FragmentPolicy};

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ChangelogError, ChangelogResult, ConfigError, ConfigResult};

pub use release::ReleaseRecord;

pub use template::{TemplateKey, TemplateProvider, Templates};
