//! Provides the high-level Spec API for comparing OpenAPI contracts.

use crate::compat::{BreakingEngine, CheckConfig, CheckResult};
use crate::contract::{Document, OperationRef};
use crate::diff::{self, Diff, DiffConfig, OperationsSourcesMap};
use crate::fingerprint::{combine_fingerprints, generate_fingerprint};
use crate::load::{self, SpecInfo};
use anyhow::Context;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// The result of a compatibility comparison between two contracts.
#[derive(Debug, PartialEq, Eq)]
pub enum Compatibility {
    /// The two contracts are semantically identical.
    Green,
    /// The new contract differs but no breaking change was found.
    Yellow,
    /// The new contract breaks clients of the old one.
    Red,
}

/// A loaded contract: one document, or fragments composed into one.
#[derive(Debug, Clone)]
pub struct Spec {
    /// File, directory, or `<inline>` the contract was loaded from.
    pub url: String,
    pub document: Arc<Document>,
    /// Fragment that defined each operation.
    pub sources: IndexMap<OperationRef, String>,
    /// The exact semantic fingerprint.
    pub fingerprint: String,
}

impl Spec {
    /// Creates a new `Spec` from the content of a single contract.
    pub fn try_from(content: &str) -> anyhow::Result<Self> {
        Self::from_content("<inline>", content)
    }

    /// Loads a single contract file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = load::read_file(path)?;
        Self::from_content(&path.display().to_string(), &content)
            .with_context(|| format!("Failed to load contract '{}'", path.display()))
    }

    /// Loads every fragment below `dir` and composes them.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut fragments = Vec::new();
        let mut fingerprints = Vec::new();
        for path in load::fragment_paths(dir)? {
            let url = path.display().to_string();
            let content = load::read_file(&path)?;
            let document = load::from_str(&content)
                .with_context(|| format!("Failed to load fragment '{url}'"))?;
            let name = path
                .strip_prefix(dir)
                .unwrap_or(path.as_path())
                .display()
                .to_string();
            fingerprints.push((name, generate_fingerprint(&content)?));
            fragments.push(SpecInfo::new(url, document));
        }

        let fingerprint = combine_fingerprints(
            fingerprints
                .iter()
                .map(|(name, fingerprint)| (name.as_str(), fingerprint.as_str())),
        );
        Self::compose(dir.display().to_string(), &fragments, fingerprint)
    }

    fn from_content(url: &str, content: &str) -> anyhow::Result<Self> {
        let fingerprint = generate_fingerprint(content)?;
        let info = SpecInfo::new(url, load::from_str(content)?);
        Self::compose(url.to_string(), &[info], fingerprint)
    }

    fn compose(url: String, fragments: &[SpecInfo], fingerprint: String) -> anyhow::Result<Self> {
        let (document, sources) = load::compose(fragments)
            .with_context(|| format!("Failed to compose contract '{url}'"))?;
        Ok(Spec {
            url,
            document: Arc::new(document),
            sources,
            fingerprint,
        })
    }

    /// Diffs this `Spec` (the old version) against `new_spec`.
    pub fn diff_with(&self, new_spec: &Spec, config: &DiffConfig) -> (Diff, OperationsSourcesMap) {
        let sources = OperationsSourcesMap::new(
            self.sources.iter().map(|(op, url)| (op.clone(), url.clone())),
            new_spec.sources.iter().map(|(op, url)| (op.clone(), url.clone())),
        )
        .rewritten(config);
        let diff = diff::get(config, self.document.clone(), new_spec.document.clone());
        (diff, sources)
    }

    /// Compares this `Spec` (the "old" version) with another `Spec` (the "new" version)
    /// to determine their compatibility level.
    pub fn compare_with(&self, new_spec: &Spec) -> Compatibility {
        if self.fingerprint == new_spec.fingerprint {
            return Compatibility::Green;
        }
        if self.check_breaking_changes(new_spec).has_breaking_changes {
            Compatibility::Red
        } else {
            Compatibility::Yellow
        }
    }

    /// Runs every rule with the default configuration.
    pub fn check_breaking_changes(&self, new_spec: &Spec) -> CheckResult {
        self.check_breaking_changes_with_config(new_spec, &CheckConfig::default())
    }

    /// Runs the rules selected by `config`.
    pub fn check_breaking_changes_with_config(
        &self,
        new_spec: &Spec,
        config: &CheckConfig,
    ) -> CheckResult {
        self.check_breaking_changes_filtered(new_spec, config, DiffConfig::new())
    }

    /// Runs the rules selected by `config` over a diff shaped by `diff_config`,
    /// which also compares every extension `config` includes.
    pub fn check_breaking_changes_filtered(
        &self,
        new_spec: &Spec,
        config: &CheckConfig,
        diff_config: DiffConfig,
    ) -> CheckResult {
        let diff_config = config.extend_diff_config(diff_config);
        let (diff, sources) = self.diff_with(new_spec, &diff_config);
        BreakingEngine::new().check(&diff, &sources, config)
    }
}

impl std::str::FromStr for Spec {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::try_from(content)
    }
}
