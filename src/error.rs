//! Error types surfaced by loading, composing, and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or build a contract document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk directory '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("'{at}' must be {expected}")]
    Shape { at: String, expected: &'static str },
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),
    #[error("external reference '{0}' is not supported")]
    ExternalRef(String),
    #[error("no contract fragments found in '{0}'")]
    NoFragments(PathBuf),
}

/// Failure to merge contract fragments into one document.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("endpoint {method} {path} is defined in both '{first}' and '{second}'")]
    DuplicateEndpoint {
        path: String,
        method: String,
        first: String,
        second: String,
    },
}

/// Failure to load checker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown rule category: {0}")]
    UnknownCategory(String),
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
