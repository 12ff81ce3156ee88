//! Correlates operations with the document or fragment that defined them.

use crate::contract::OperationRef;
use crate::diff::config::{DiffConfig, Side};
use crate::load::SpecInfo;
use std::collections::HashMap;

/// Source attribution for both sides of a diff run.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct OperationsSourcesMap {
    base: HashMap<OperationRef, String>,
    revision: HashMap<OperationRef, String>,
}

impl OperationsSourcesMap {
    pub fn new(
        base: impl IntoIterator<Item = (OperationRef, String)>,
        revision: impl IntoIterator<Item = (OperationRef, String)>,
    ) -> Self {
        Self {
            base: base.into_iter().collect(),
            revision: revision.into_iter().collect(),
        }
    }

    /// Attributes every operation of each document to that document.
    pub fn from_single(base: &SpecInfo, revision: &SpecInfo) -> Self {
        Self::new(attribute_all(base), attribute_all(revision))
    }

    /// Re-keys both sides to the paths `config` compares them under.
    pub fn rewritten(self, config: &DiffConfig) -> Self {
        if !config.rewrites_paths() {
            return self;
        }
        let rekey = |sources: HashMap<OperationRef, String>, side: Side| -> HashMap<_, _> {
            sources
                .into_iter()
                .filter_map(|(op, source)| {
                    let path = config.compared_path(&op.path, side)?;
                    Some((OperationRef::new(&path, &op.method), source))
                })
                .collect()
        };
        Self {
            base: rekey(self.base, Side::Base),
            revision: rekey(self.revision, Side::Revision),
        }
    }

    /// Source of a revision-side operation, or `""` when unknown.
    pub fn revision_source(&self, op: &OperationRef) -> &str {
        self.revision.get(op).map_or("", String::as_str)
    }

    /// Source of a base-side operation, or `""` when unknown.
    pub fn base_source(&self, op: &OperationRef) -> &str {
        self.base.get(op).map_or("", String::as_str)
    }
}

fn attribute_all(info: &SpecInfo) -> Vec<(OperationRef, String)> {
    info.spec
        .operations()
        .map(|(op, _)| (op, info.url.clone()))
        .collect()
}
