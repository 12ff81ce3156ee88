//! Structural comparison of two contract trees.
//!
//! Each level partitions its keys into added, deleted, and candidate keys,
//! then recurses into the candidates. A candidate is recorded as modified
//! only when the recursive diff is non-empty.

use crate::contract::{
    Content, Document, Operation, OperationRef, PathItem, RequestBody, Response, SchemaId,
};
use crate::diff::config::{DiffConfig, Side};
use crate::diff::model::{
    ContentDiff, Diff, ExtensionsDiff, MediaTypeDiff, MethodDiff, OperationsDiff, PathDiff,
    PathsDiff, RequestBodyDiff, ResponseDiff, ResponsesDiff, SchemaDiff, value_diff,
};
use crate::diff::sources::OperationsSourcesMap;
use crate::error::ComposeError;
use crate::load::{self, SpecInfo};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

//==============================================================================
// Entry Points
//==============================================================================

/// Diffs two documents. Path options in `config` apply to both documents
/// first, so the returned diff holds the documents as compared.
pub fn get(config: &DiffConfig, base: Arc<Document>, revision: Arc<Document>) -> Diff {
    let base = config.select(&base, Side::Base);
    let revision = config.select(&revision, Side::Revision);
    let paths_diff = DiffState::new(config, &base, &revision).paths_diff();
    debug!(empty = paths_diff.is_none(), "diff complete");
    Diff {
        base,
        revision,
        paths_diff,
    }
}

/// Diffs two single documents, attributing every operation to its document.
pub fn get_with_operations_sources_map(
    config: &DiffConfig,
    base: &SpecInfo,
    revision: &SpecInfo,
) -> (Diff, OperationsSourcesMap) {
    let sources = OperationsSourcesMap::from_single(base, revision).rewritten(config);
    let diff = get(config, base.spec.clone(), revision.spec.clone());
    (diff, sources)
}

/// Diffs two sets of fragments, each merged into one document first.
pub fn get_composed(
    config: &DiffConfig,
    base: &[SpecInfo],
    revision: &[SpecInfo],
) -> Result<(Diff, OperationsSourcesMap), ComposeError> {
    let (base_doc, base_sources) = load::compose(base)?;
    let (revision_doc, revision_sources) = load::compose(revision)?;
    debug!(
        base_fragments = base.len(),
        revision_fragments = revision.len(),
        "composed fragments"
    );
    let sources = OperationsSourcesMap::new(base_sources, revision_sources).rewritten(config);
    let diff = get(config, Arc::new(base_doc), Arc::new(revision_doc));
    Ok((diff, sources))
}

//==============================================================================
// Traversal State
//==============================================================================

/// Per-run traversal state. The visited set is never shared between runs.
pub(super) struct DiffState<'a> {
    pub(super) config: &'a DiffConfig,
    pub(super) base: &'a Document,
    pub(super) revision: &'a Document,
    /// Schema pairs on the current descent path.
    pub(super) visited: HashSet<(SchemaId, SchemaId)>,
    /// Results of schema pairs already compared in this run.
    pub(super) finished: HashMap<(SchemaId, SchemaId), Option<SchemaDiff>>,
}

/// Splits keys into `(added, deleted, common)`. Added keys follow revision
/// order; deleted and common keys follow base order.
pub(super) fn partition<'k, A, B>(
    base: &'k IndexMap<String, A>,
    revision: &'k IndexMap<String, B>,
) -> (Vec<String>, Vec<String>, Vec<&'k str>) {
    let added = revision
        .keys()
        .filter(|key| !base.contains_key(*key))
        .cloned()
        .collect();
    let mut deleted = Vec::new();
    let mut common = Vec::new();
    for key in base.keys() {
        if revision.contains_key(key) {
            common.push(key.as_str());
        } else {
            deleted.push(key.clone());
        }
    }
    (added, deleted, common)
}

impl<'a> DiffState<'a> {
    fn new(config: &'a DiffConfig, base: &'a Document, revision: &'a Document) -> Self {
        Self {
            config,
            base,
            revision,
            visited: HashSet::new(),
            finished: HashMap::new(),
        }
    }

    fn paths_diff(&mut self) -> Option<PathsDiff> {
        if self.config.exclude_endpoints {
            return None;
        }
        let (base, revision) = (self.base, self.revision);
        let (added, deleted, common) = partition(&base.paths, &revision.paths);
        let mut diff = PathsDiff {
            added,
            deleted,
            ..Default::default()
        };
        for path in common {
            let path_diff = self.path_diff(path, &base.paths[path], &revision.paths[path]);
            if let Some(path_diff) = path_diff {
                diff.modified.insert(path.to_string(), path_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    fn path_diff(&mut self, path: &str, base: &PathItem, revision: &PathItem) -> Option<PathDiff> {
        let diff = PathDiff {
            operations_diff: self.operations_diff(path, base, revision),
        };
        (!diff.is_empty()).then_some(diff)
    }

    fn operations_diff(
        &mut self,
        path: &str,
        base: &PathItem,
        revision: &PathItem,
    ) -> Option<OperationsDiff> {
        let (added, deleted, common) = partition(&base.operations, &revision.operations);
        let mut diff = OperationsDiff {
            added,
            deleted,
            ..Default::default()
        };
        for method in common {
            let method_diff = self.method_diff(
                path,
                method,
                &base.operations[method],
                &revision.operations[method],
            );
            if let Some(method_diff) = method_diff {
                diff.modified.insert(method.to_string(), method_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    fn method_diff(
        &mut self,
        path: &str,
        method: &str,
        base: &Operation,
        revision: &Operation,
    ) -> Option<MethodDiff> {
        let mut diff = MethodDiff {
            base: OperationRef::new(path, method),
            revision: OperationRef::new(path, method),
            operation_id_diff: value_diff(&base.operation_id, &revision.operation_id),
            deprecated_diff: value_diff(&base.deprecated, &revision.deprecated),
            extensions_diff: self.extensions_diff(&base.extensions, &revision.extensions),
            request_body_diff: self
                .request_body_diff(base.request_body.as_ref(), revision.request_body.as_ref()),
            responses_diff: self.responses_diff(&base.responses, &revision.responses),
            ..Default::default()
        };
        if !self.config.exclude_description {
            diff.summary_diff = value_diff(&base.summary, &revision.summary);
            diff.description_diff = value_diff(&base.description, &revision.description);
        }
        (!diff.is_empty()).then_some(diff)
    }

    fn request_body_diff(
        &mut self,
        base: Option<&RequestBody>,
        revision: Option<&RequestBody>,
    ) -> Option<RequestBodyDiff> {
        let diff = match (base, revision) {
            (None, None) => return None,
            (None, Some(_)) => RequestBodyDiff {
                added: true,
                ..Default::default()
            },
            (Some(_), None) => RequestBodyDiff {
                deleted: true,
                ..Default::default()
            },
            (Some(base), Some(revision)) => {
                let mut diff = RequestBodyDiff {
                    required_diff: value_diff(&base.required, &revision.required),
                    content_diff: self.content_diff(&base.content, &revision.content),
                    ..Default::default()
                };
                if !self.config.exclude_description {
                    diff.description_diff = value_diff(&base.description, &revision.description);
                }
                diff
            }
        };
        (!diff.is_empty()).then_some(diff)
    }

    fn responses_diff(
        &mut self,
        base: &IndexMap<String, Response>,
        revision: &IndexMap<String, Response>,
    ) -> Option<ResponsesDiff> {
        let (added, deleted, common) = partition(base, revision);
        let mut diff = ResponsesDiff {
            added,
            deleted,
            ..Default::default()
        };
        for status in common {
            let (base, revision) = (&base[status], &revision[status]);
            let mut response_diff = ResponseDiff {
                content_diff: self.content_diff(&base.content, &revision.content),
                ..Default::default()
            };
            if !self.config.exclude_description {
                response_diff.description_diff =
                    value_diff(&base.description, &revision.description);
            }
            if !response_diff.is_empty() {
                diff.modified.insert(status.to_string(), response_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    fn content_diff(&mut self, base: &Content, revision: &Content) -> Option<ContentDiff> {
        let (added, deleted, common) = partition(base, revision);
        let mut diff = ContentDiff {
            media_type_added: added,
            media_type_deleted: deleted,
            ..Default::default()
        };
        for name in common {
            let media_type_diff = MediaTypeDiff {
                schema_diff: self.schema_refs_diff(base[name].schema, revision[name].schema),
            };
            if !media_type_diff.is_empty() {
                diff.media_type_modified.insert(name.to_string(), media_type_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    /// Compares only the extensions named in the configuration.
    pub(super) fn extensions_diff(
        &self,
        base: &IndexMap<String, Value>,
        revision: &IndexMap<String, Value>,
    ) -> Option<ExtensionsDiff> {
        let included = |name: &&String| self.config.is_extension_included(name);
        let mut diff = ExtensionsDiff {
            added: revision
                .keys()
                .filter(included)
                .filter(|name| !base.contains_key(*name))
                .cloned()
                .collect(),
            ..Default::default()
        };
        for (name, base_value) in base.iter().filter(|(name, _)| included(name)) {
            match revision.get(name) {
                None => diff.deleted.push(name.clone()),
                Some(revision_value) => {
                    if let Some(change) = value_diff(base_value, revision_value) {
                        diff.modified.insert(name.clone(), change);
                    }
                }
            }
        }
        (!diff.is_empty()).then_some(diff)
    }
}
