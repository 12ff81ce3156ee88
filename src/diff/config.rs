//! Options controlling which contract elements take part in comparison.

use crate::contract::Document;
use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;

/// `x-stability-level` extension on operations.
pub const STABILITY_LEVEL_EXTENSION: &str = "x-stability-level";
/// `x-extensible-enum` extension on schemas.
pub const EXTENSIBLE_ENUM_EXTENSION: &str = "x-extensible-enum";
/// `x-sunset` extension on deprecated operations.
pub const SUNSET_EXTENSION: &str = "x-sunset";

/// Which document of a diff run something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Base,
    Revision,
}

/// A regular expression matched against paths or extension names.
///
/// Unanchored: `/pets` matches `/v1/pets/{id}` too.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Pattern)
            .map_err(|source| ConfigError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::str::FromStr for Pattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// Configuration for the diff engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Extensions compared on operations and schemas; all others are ignored.
    #[serde(default)]
    pub include_extensions: BTreeSet<String>,
    /// Skip summary and description changes.
    #[serde(default)]
    pub exclude_description: bool,
    /// Skip the paths section entirely.
    #[serde(default)]
    pub exclude_endpoints: bool,
    /// Compare only paths matching this expression, after prefix rewriting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_filter: Option<Pattern>,
    /// Drop operations carrying an extension whose name matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_extension: Option<Pattern>,
    /// Prepended to every base path after stripping.
    #[serde(default)]
    pub path_prefix_base: String,
    /// Prepended to every revision path after stripping.
    #[serde(default)]
    pub path_prefix_revision: String,
    /// Removed from the start of every base path.
    #[serde(default)]
    pub path_strip_prefix_base: String,
    /// Removed from the start of every revision path.
    #[serde(default)]
    pub path_strip_prefix_revision: String,
}

impl DiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, name: &str) -> Self {
        self.include_extensions.insert(name.to_string());
        self
    }

    pub fn is_extension_included(&self, name: &str) -> bool {
        self.include_extensions.contains(name)
    }

    /// Whether any option changes the set or the names of compared paths.
    pub fn rewrites_paths(&self) -> bool {
        self.path_filter.is_some()
            || self.filter_extension.is_some()
            || !self.path_prefix_base.is_empty()
            || !self.path_prefix_revision.is_empty()
            || !self.path_strip_prefix_base.is_empty()
            || !self.path_strip_prefix_revision.is_empty()
    }

    /// The name `path` of the `side` document is compared under, or `None`
    /// when the path filter excludes it.
    pub fn compared_path(&self, path: &str, side: Side) -> Option<String> {
        let (strip, prefix) = match side {
            Side::Base => (&self.path_strip_prefix_base, &self.path_prefix_base),
            Side::Revision => (&self.path_strip_prefix_revision, &self.path_prefix_revision),
        };
        let stripped = path.strip_prefix(strip.as_str()).unwrap_or(path);
        let compared = format!("{prefix}{stripped}");
        match &self.path_filter {
            Some(filter) if !filter.is_match(&compared) => None,
            _ => Some(compared),
        }
    }

    /// The `side` document as the engine compares it: paths renamed and
    /// filtered, operations with a filtered extension removed. Paths that
    /// collide after renaming keep the last one.
    pub fn select(&self, document: &Arc<Document>, side: Side) -> Arc<Document> {
        if !self.rewrites_paths() {
            return document.clone();
        }
        let mut selected = (**document).clone();
        selected.paths = std::mem::take(&mut selected.paths)
            .into_iter()
            .filter_map(|(path, mut item)| {
                let compared = self.compared_path(&path, side)?;
                if let Some(filter) = &self.filter_extension {
                    item.operations
                        .retain(|_, op| !op.extensions.keys().any(|name| filter.is_match(name)));
                }
                Some((compared, item))
            })
            .collect();
        Arc::new(selected)
    }
}
