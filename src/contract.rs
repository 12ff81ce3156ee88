//! In-memory contract tree consumed by the diff engine.
//!
//! Schemas live in an arena owned by the [`Document`]. Every `$ref` to a
//! component resolves to the component's [`SchemaId`], so a self-referential
//! schema is a cycle of ids rather than an infinitely nested value.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

//==============================================================================
// Identity Types
//==============================================================================

/// Index of a schema inside its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SchemaId(pub usize);

/// Identity of one operation within a document: `METHOD path`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationRef {
    pub path: String,
    pub method: String,
}

impl OperationRef {
    pub fn new(path: &str, method: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
        }
    }
}

impl std::fmt::Display for OperationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

//==============================================================================
// Contract Tree
//==============================================================================

/// A loaded, reference-resolved API contract.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Document {
    pub paths: IndexMap<String, PathItem>,
    /// Schema arena. `SchemaId(n)` indexes this vector.
    pub schemas: Vec<Schema>,
    /// Named component schemas.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub components: IndexMap<String, SchemaId>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PathItem {
    pub operations: IndexMap<String, Operation>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    /// Specification extensions (`x-*`) declared on the operation.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: Content,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: Content,
}

/// Media type name (e.g. `application/json`) to media type object.
pub type Content = IndexMap<String, MediaType>;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaId>,
}

/// A single schema node. Nested schemas are referenced by arena id.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    /// Shifts every nested schema reference by `offset`. Used when arenas of
    /// several fragments are concatenated.
    pub(crate) fn relocate(&mut self, offset: usize) {
        for id in self.properties.values_mut() {
            id.0 += offset;
        }
        if let Some(items) = self.items.as_mut() {
            items.0 += offset;
        }
        for id in self
            .all_of
            .iter_mut()
            .chain(self.one_of.iter_mut())
            .chain(self.any_of.iter_mut())
        {
            id.0 += offset;
        }
    }
}

impl Operation {
    pub(crate) fn relocate(&mut self, offset: usize) {
        let request_content = self.request_body.iter_mut().map(|body| &mut body.content);
        let response_content = self.responses.values_mut().map(|response| &mut response.content);
        for content in request_content.chain(response_content) {
            for media_type in content.values_mut() {
                if let Some(schema) = media_type.schema.as_mut() {
                    schema.0 += offset;
                }
            }
        }
    }
}

impl Document {
    /// Resolves a schema id against this document's arena.
    ///
    /// Ids are only ever produced by the loader for the same document, so a
    /// miss means the tree was built inconsistently.
    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.schemas[id.0]
    }

    pub fn operation(&self, op: &OperationRef) -> Option<&Operation> {
        self.paths
            .get(&op.path)
            .and_then(|item| item.operations.get(&op.method))
    }

    /// Iterates every operation in document order.
    pub fn operations(&self) -> impl Iterator<Item = (OperationRef, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations
                .iter()
                .map(move |(method, op)| (OperationRef::new(path, method), op))
        })
    }
}
