//! Structural diff of OpenAPI contracts and rule-based detection of
//! breaking changes.
//!
//! [`load`] turns YAML/JSON documents into resolved [`contract::Document`]
//! trees, [`diff`] compares two of them into a typed [`diff::Diff`], and
//! [`compat`] runs the rule catalog over that diff. [`Spec`] wraps the whole
//! pipeline.

pub mod compat;
pub mod contract;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod load;
pub mod spec;

pub use error::{ComposeError, ConfigError, LoadError};
pub use fingerprint::generate_fingerprint;
pub use spec::{Compatibility, Spec};
