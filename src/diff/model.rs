//! Diff tree records, one explicit struct per contract level.
//!
//! Every keyed level splits its keys into three disjoint partitions:
//! `added` (revision only), `deleted` (base only), and `modified` (both
//! sides, structurally different). Keys present on both sides with no
//! difference at any depth appear in none of them.

use crate::contract::{Document, OperationRef, SchemaId};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Root of the diff tree.
#[derive(Debug, Clone, Serialize)]
pub struct Diff {
    #[serde(skip)]
    pub base: Arc<Document>,
    #[serde(skip)]
    pub revision: Arc<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths_diff: Option<PathsDiff>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.paths_diff.is_none()
    }

    /// Iterates `(path, method, diff)` for every modified operation of every
    /// modified path, in diff order.
    pub fn modified_operations(&self) -> impl Iterator<Item = (&str, &str, &MethodDiff)> {
        self.paths_diff
            .iter()
            .flat_map(|paths| paths.modified.iter())
            .filter_map(|(path, path_diff)| {
                path_diff
                    .operations_diff
                    .as_ref()
                    .map(|ops| (path.as_str(), ops))
            })
            .flat_map(|(path, ops)| {
                ops.modified
                    .iter()
                    .map(move |(method, method_diff)| (path, method.as_str(), method_diff))
            })
    }
}

//==============================================================================
// Scalar and List Diffs
//==============================================================================

/// A scalar value that differs between base and revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDiff<T> {
    pub from: T,
    pub to: T,
}

pub(crate) fn value_diff<T: PartialEq + Clone>(from: &T, to: &T) -> Option<ValueDiff<T>> {
    (from != to).then(|| ValueDiff {
        from: from.clone(),
        to: to.clone(),
    })
}

/// Names added to or removed from an unordered list (e.g. `required`).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StringsDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
}

impl StringsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

pub(crate) fn strings_diff(base: &[String], revision: &[String]) -> Option<StringsDiff> {
    let diff = StringsDiff {
        added: revision
            .iter()
            .filter(|name| !base.contains(*name))
            .cloned()
            .collect(),
        deleted: base
            .iter()
            .filter(|name| !revision.contains(*name))
            .cloned()
            .collect(),
    };
    (!diff.is_empty()).then_some(diff)
}

/// Changes to the included `x-*` extensions.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExtensionsDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<String, ValueDiff<Value>>,
}

impl ExtensionsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

//==============================================================================
// Paths and Operations
//==============================================================================

#[derive(Debug, Default, Clone, Serialize)]
pub struct PathsDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<String, PathDiff>,
}

impl PathsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PathDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_diff: Option<OperationsDiff>,
}

impl PathDiff {
    pub fn is_empty(&self) -> bool {
        self.operations_diff.is_none()
    }
}

/// Operations of one path, keyed by upper-case method.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OperationsDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<String, MethodDiff>,
}

impl OperationsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct MethodDiff {
    #[serde(skip)]
    pub base: OperationRef,
    #[serde(skip)]
    pub revision: OperationRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions_diff: Option<ExtensionsDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_diff: Option<RequestBodyDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses_diff: Option<ResponsesDiff>,
}

impl MethodDiff {
    pub fn is_empty(&self) -> bool {
        self.operation_id_diff.is_none()
            && self.summary_diff.is_none()
            && self.description_diff.is_none()
            && self.deprecated_diff.is_none()
            && self.extensions_diff.is_none()
            && self.request_body_diff.is_none()
            && self.responses_diff.is_none()
    }

    /// Modified request media types, or nothing when the body did not change.
    pub fn request_media_types(&self) -> impl Iterator<Item = (&str, &MediaTypeDiff)> {
        self.request_body_diff
            .iter()
            .filter_map(|body| body.content_diff.as_ref())
            .flat_map(|content| content.media_type_modified.iter())
            .map(|(name, media_type)| (name.as_str(), media_type))
    }

    /// Modified media types of every modified response, with their status.
    pub fn response_media_types(&self) -> impl Iterator<Item = (&str, &str, &MediaTypeDiff)> {
        self.responses_diff
            .iter()
            .flat_map(|responses| responses.modified.iter())
            .filter_map(|(status, response)| {
                response
                    .content_diff
                    .as_ref()
                    .map(|content| (status.as_str(), content))
            })
            .flat_map(|(status, content)| {
                content
                    .media_type_modified
                    .iter()
                    .map(move |(name, media_type)| (status, name.as_str(), media_type))
            })
    }
}

//==============================================================================
// Bodies, Responses, Content
//==============================================================================

#[derive(Debug, Default, Clone, Serialize)]
pub struct RequestBodyDiff {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub added: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_diff: Option<ContentDiff>,
}

impl RequestBodyDiff {
    pub fn is_empty(&self) -> bool {
        !self.added
            && !self.deleted
            && self.required_diff.is_none()
            && self.description_diff.is_none()
            && self.content_diff.is_none()
    }
}

/// Responses keyed by status code (or `default`).
#[derive(Debug, Default, Clone, Serialize)]
pub struct ResponsesDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<String, ResponseDiff>,
}

impl ResponsesDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ResponseDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_diff: Option<ContentDiff>,
}

impl ResponseDiff {
    pub fn is_empty(&self) -> bool {
        self.description_diff.is_none() && self.content_diff.is_none()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ContentDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_type_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_type_deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub media_type_modified: IndexMap<String, MediaTypeDiff>,
}

impl ContentDiff {
    pub fn is_empty(&self) -> bool {
        self.media_type_added.is_empty()
            && self.media_type_deleted.is_empty()
            && self.media_type_modified.is_empty()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct MediaTypeDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_diff: Option<SchemaDiff>,
}

impl MediaTypeDiff {
    pub fn is_empty(&self) -> bool {
        self.schema_diff.is_none()
    }
}

//==============================================================================
// Schemas
//==============================================================================

/// Recursive schema diff. `base`/`revision` identify the compared schemas in
/// their documents' arenas.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SchemaDiff {
    #[serde(skip)]
    pub base: Option<SchemaId>,
    #[serde(skip)]
    pub revision: Option<SchemaId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub schema_added: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub schema_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_diff: Option<ValueDiff<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only_diff: Option<ValueDiff<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_diff: Option<EnumDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_diff: Option<StringsDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties_diff: Option<SchemasDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_diff: Option<Box<SchemaDiff>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of_diff: Option<SubschemasDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of_diff: Option<SubschemasDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of_diff: Option<SubschemasDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions_diff: Option<ExtensionsDiff>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        !self.schema_added
            && !self.schema_deleted
            && self.type_diff.is_none()
            && self.format_diff.is_none()
            && self.nullable_diff.is_none()
            && self.description_diff.is_none()
            && self.deprecated_diff.is_none()
            && self.read_only_diff.is_none()
            && self.write_only_diff.is_none()
            && self.enum_diff.is_none()
            && self.required_diff.is_none()
            && self.properties_diff.is_none()
            && self.items_diff.is_none()
            && self.all_of_diff.is_none()
            && self.one_of_diff.is_none()
            && self.any_of_diff.is_none()
            && self.extensions_diff.is_none()
    }

    /// True when the schema became enum-constrained.
    pub fn enum_added(&self) -> bool {
        self.enum_diff.as_ref().is_some_and(|e| e.enum_added)
    }

    /// Composition branches that were modified, in all-of, one-of, any-of order.
    pub fn modified_branches(&self) -> impl Iterator<Item = &SchemaDiff> {
        [&self.all_of_diff, &self.one_of_diff, &self.any_of_diff]
            .into_iter()
            .flatten()
            .flat_map(|branches| branches.modified.values())
    }
}

/// Object properties keyed by name.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SchemasDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<String, SchemaDiff>,
}

impl SchemasDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

/// Composition branches (`allOf`/`oneOf`/`anyOf`) keyed by position.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SubschemasDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<usize>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modified: IndexMap<usize, SchemaDiff>,
}

impl SubschemasDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

/// Enumeration constraint changes.
///
/// `enum_added` means base had no enumeration and revision has one;
/// `enum_removed` is the inverse. `added`/`deleted` values are only filled
/// when both sides are constrained.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct EnumDiff {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enum_added: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enum_removed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<Value>,
}

impl EnumDiff {
    pub fn is_empty(&self) -> bool {
        !self.enum_added && !self.enum_removed && self.added.is_empty() && self.deleted.is_empty()
    }
}

pub(crate) fn enum_diff(base: &[Value], revision: &[Value]) -> Option<EnumDiff> {
    let diff = match (base.is_empty(), revision.is_empty()) {
        (true, true) => return None,
        (true, false) => EnumDiff {
            enum_added: true,
            ..Default::default()
        },
        (false, true) => EnumDiff {
            enum_removed: true,
            ..Default::default()
        },
        (false, false) => EnumDiff {
            added: revision
                .iter()
                .filter(|value| !base.contains(*value))
                .cloned()
                .collect(),
            deleted: base
                .iter()
                .filter(|value| !revision.contains(*value))
                .cloned()
                .collect(),
            ..Default::default()
        },
    };
    (!diff.is_empty()).then_some(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_added_only_when_base_unconstrained() {
        let became = enum_diff(&[], &[json!("a"), json!("b")]).unwrap();
        assert!(became.enum_added);
        assert!(became.added.is_empty());

        let extended = enum_diff(&[json!("a")], &[json!("a"), json!("b")]).unwrap();
        assert!(!extended.enum_added);
        assert_eq!(extended.added, vec![json!("b")]);
        assert!(extended.deleted.is_empty());
    }

    #[test]
    fn test_enum_removed_and_unchanged() {
        let removed = enum_diff(&[json!(1)], &[]).unwrap();
        assert!(removed.enum_removed);
        assert!(!removed.enum_added);

        assert!(enum_diff(&[json!("x"), json!("y")], &[json!("y"), json!("x")]).is_none());
        assert!(enum_diff(&[], &[]).is_none());
    }

    #[test]
    fn test_strings_diff() {
        let base = vec!["a".to_string(), "b".to_string()];
        let revision = vec!["b".to_string(), "c".to_string()];
        let diff = strings_diff(&base, &revision).unwrap();
        assert_eq!(diff.added, vec!["c"]);
        assert_eq!(diff.deleted, vec!["a"]);
        assert!(strings_diff(&base, &base).is_none());
    }

    #[test]
    fn test_value_diff() {
        assert!(value_diff(&true, &true).is_none());
        let diff = value_diff(&Some("string".to_string()), &None).unwrap();
        assert_eq!(diff.from.as_deref(), Some("string"));
        assert!(diff.to.is_none());
    }
}
