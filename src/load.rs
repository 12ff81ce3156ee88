//! Converts raw YAML/JSON contract documents into the resolved
//! [`Document`] tree consumed by the diff engine.

use crate::contract::{
    Content, Document, MediaType, Operation, OperationRef, PathItem, RequestBody, Response,
    Schema, SchemaId,
};
use crate::error::{ComposeError, LoadError};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

const METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];
const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// A loaded document together with the location it was loaded from.
#[derive(Debug, Clone)]
pub struct SpecInfo {
    pub url: String,
    pub spec: Arc<Document>,
}

impl SpecInfo {
    pub fn new(url: impl Into<String>, spec: Document) -> Self {
        Self {
            url: url.into(),
            spec: Arc::new(spec),
        }
    }
}

//==============================================================================
// Entry Points
//==============================================================================

/// Parses and resolves a single YAML or JSON contract document.
pub fn from_str(content: &str) -> Result<Document, LoadError> {
    let root: Value = serde_yaml::from_str(content)?;
    DocumentBuilder::new(&root).build()
}

/// Loads one contract document from disk.
pub fn from_file(path: &Path) -> Result<SpecInfo, LoadError> {
    let content = read_file(path)?;
    let spec = from_str(&content)?;
    debug!(path = %path.display(), paths = spec.paths.len(), "loaded contract");
    Ok(SpecInfo::new(path.display().to_string(), spec))
}

/// Reads a contract file into memory.
pub fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every contract fragment below `dir`, in file-name order.
pub fn from_dir(dir: &Path) -> Result<Vec<SpecInfo>, LoadError> {
    fragment_paths(dir)?
        .iter()
        .map(|path| from_file(path))
        .collect()
}

/// Lists the YAML/JSON files below `dir`, in file-name order.
pub fn fragment_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_contract_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    if paths.is_empty() {
        return Err(LoadError::NoFragments(dir.to_path_buf()));
    }
    Ok(paths)
}

fn is_contract_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

/// Merges fragments into a single document, recording which fragment
/// contributed each operation.
pub fn compose(
    infos: &[SpecInfo],
) -> Result<(Document, IndexMap<OperationRef, String>), ComposeError> {
    let mut merged = Document::default();
    let mut sources: IndexMap<OperationRef, String> = IndexMap::new();

    for info in infos {
        let offset = merged.schemas.len();
        merged.schemas.extend(info.spec.schemas.iter().cloned().map(|mut schema| {
            schema.relocate(offset);
            schema
        }));
        for (name, id) in &info.spec.components {
            merged
                .components
                .entry(name.clone())
                .or_insert(SchemaId(id.0 + offset));
        }
        for (path, item) in &info.spec.paths {
            for (method, op) in &item.operations {
                let op_ref = OperationRef::new(path, method);
                if let Some(first) = sources.get(&op_ref) {
                    return Err(ComposeError::DuplicateEndpoint {
                        path: path.clone(),
                        method: method.clone(),
                        first: first.clone(),
                        second: info.url.clone(),
                    });
                }
                let mut op = op.clone();
                op.relocate(offset);
                merged
                    .paths
                    .entry(path.clone())
                    .or_default()
                    .operations
                    .insert(method.clone(), op);
                sources.insert(op_ref, info.url.clone());
            }
        }
    }

    Ok((merged, sources))
}

//==============================================================================
// Document Builder
//==============================================================================

struct DocumentBuilder<'a> {
    root: &'a Value,
    doc: Document,
}

impl<'a> DocumentBuilder<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            doc: Document::default(),
        }
    }

    fn build(mut self) -> Result<Document, LoadError> {
        let root = self.root;
        as_mapping(root, "document")?;

        if let Some(schemas) = root.get("components").and_then(|c| c.get("schemas")) {
            let schemas = as_mapping(schemas, "components.schemas")?;
            // Reserve every slot first so recursive references resolve.
            for name in schemas.keys() {
                let name = key_string(name, "components.schemas")?;
                let id = self.alloc();
                self.doc.components.insert(name, id);
            }
            for (name, node) in schemas {
                let name = key_string(name, "components.schemas")?;
                let at = format!("components.schemas.{name}");
                let schema = match ref_target(node, &at)? {
                    // An aliased component wraps its target.
                    Some(target) => Schema {
                        all_of: vec![self.resolve_schema_ref(target)?],
                        ..Default::default()
                    },
                    None => self.schema_body(node, &at)?,
                };
                let id = self.doc.components[&name];
                self.doc.schemas[id.0] = schema;
            }
        }

        if let Some(paths) = root.get("paths") {
            for (path, item) in as_mapping(paths, "paths")? {
                let path = key_string(path, "paths")?;
                let item = self.path_item(item, &path)?;
                self.doc.paths.insert(path, item);
            }
        }

        Ok(self.doc)
    }

    fn alloc(&mut self) -> SchemaId {
        self.doc.schemas.push(Schema::default());
        SchemaId(self.doc.schemas.len() - 1)
    }

    fn path_item(&mut self, node: &'a Value, path: &str) -> Result<PathItem, LoadError> {
        let mut item = PathItem::default();
        for (key, op) in as_mapping(node, path)? {
            let Some(method) = key.as_str().filter(|k| METHODS.contains(k)) else {
                continue;
            };
            let at = format!("{path}.{method}");
            item.operations
                .insert(method.to_uppercase(), self.operation(op, &at)?);
        }
        Ok(item)
    }

    fn operation(&mut self, node: &'a Value, at: &str) -> Result<Operation, LoadError> {
        let mut op = Operation {
            operation_id: opt_string(node, "operationId", at)?,
            summary: opt_string(node, "summary", at)?,
            description: opt_string(node, "description", at)?,
            deprecated: opt_bool(node, "deprecated", at)?,
            extensions: extensions(node, at)?,
            ..Default::default()
        };

        if let Some(body) = node.get("requestBody") {
            let at = format!("{at}.requestBody");
            let body = self.follow_component(body, REQUEST_BODY_REF_PREFIX, &at)?;
            op.request_body = Some(RequestBody {
                required: opt_bool(body, "required", &at)?,
                description: opt_string(body, "description", &at)?,
                content: self.content(body, &at)?,
            });
        }

        if let Some(responses) = node.get("responses") {
            for (status, response) in as_mapping(responses, &format!("{at}.responses"))? {
                let status = key_string(status, at)?;
                let at = format!("{at}.responses.{status}");
                let response = self.follow_component(response, RESPONSE_REF_PREFIX, &at)?;
                op.responses.insert(
                    status,
                    Response {
                        description: opt_string(response, "description", &at)?,
                        content: self.content(response, &at)?,
                    },
                );
            }
        }

        Ok(op)
    }

    fn content(&mut self, node: &'a Value, at: &str) -> Result<Content, LoadError> {
        let mut content = Content::new();
        let Some(media_types) = node.get("content") else {
            return Ok(content);
        };
        for (name, media_type) in as_mapping(media_types, &format!("{at}.content"))? {
            let name = key_string(name, at)?;
            let at = format!("{at}.content.{name}");
            let schema = match media_type.get("schema") {
                Some(schema) => Some(self.schema_ref(schema, &format!("{at}.schema"))?),
                None => None,
            };
            content.insert(name, MediaType { schema });
        }
        Ok(content)
    }

    /// Replaces a `$ref` to a reusable component with the component itself.
    fn follow_component(
        &self,
        node: &'a Value,
        prefix: &str,
        at: &str,
    ) -> Result<&'a Value, LoadError> {
        let Some(target) = ref_target(node, at)? else {
            return Ok(node);
        };
        let name = local_ref(target, prefix)?;
        let kind = prefix.trim_start_matches("#/components/").trim_end_matches('/');
        let root = self.root;
        let resolved = root
            .get("components")
            .and_then(|c| c.get(kind))
            .and_then(|c| c.get(name))
            .ok_or_else(|| LoadError::UnresolvedRef(target.to_string()))?;
        if ref_target(resolved, at)?.is_some() {
            return Err(LoadError::Shape {
                at: format!("components.{kind}.{name}"),
                expected: "an inline object",
            });
        }
        Ok(resolved)
    }

    fn resolve_schema_ref(&self, target: &str) -> Result<SchemaId, LoadError> {
        let name = local_ref(target, SCHEMA_REF_PREFIX)?;
        self.doc
            .components
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnresolvedRef(target.to_string()))
    }

    fn schema_ref(&mut self, node: &'a Value, at: &str) -> Result<SchemaId, LoadError> {
        if let Some(target) = ref_target(node, at)? {
            return self.resolve_schema_ref(target);
        }
        let id = self.alloc();
        let schema = self.schema_body(node, at)?;
        self.doc.schemas[id.0] = schema;
        Ok(id)
    }

    fn schema_body(&mut self, node: &'a Value, at: &str) -> Result<Schema, LoadError> {
        as_mapping(node, at)?;
        let mut schema = Schema {
            format: opt_string(node, "format", at)?,
            nullable: opt_bool(node, "nullable", at)?,
            description: opt_string(node, "description", at)?,
            deprecated: opt_bool(node, "deprecated", at)?,
            read_only: opt_bool(node, "readOnly", at)?,
            write_only: opt_bool(node, "writeOnly", at)?,
            extensions: extensions(node, at)?,
            ..Default::default()
        };

        match node.get("type") {
            None | Some(Value::Null) => {}
            Some(Value::String(name)) => schema.type_name = Some(name.clone()),
            // 3.1 style: `type: [string, "null"]`
            Some(Value::Sequence(names)) => {
                for name in names {
                    match name.as_str() {
                        Some("null") => schema.nullable = true,
                        Some(name) if schema.type_name.is_none() => {
                            schema.type_name = Some(name.to_string());
                        }
                        Some(_) => {
                            return Err(LoadError::Shape {
                                at: format!("{at}.type"),
                                expected: "a single type, optionally with \"null\"",
                            });
                        }
                        None => {
                            return Err(LoadError::Shape {
                                at: format!("{at}.type"),
                                expected: "a string or list of strings",
                            });
                        }
                    }
                }
            }
            Some(_) => {
                return Err(LoadError::Shape {
                    at: format!("{at}.type"),
                    expected: "a string or list of strings",
                });
            }
        }

        if let Some(values) = node.get("enum") {
            for value in as_sequence(values, &format!("{at}.enum"))? {
                schema.enum_values.push(to_json(value, at)?);
            }
        }

        if let Some(required) = node.get("required") {
            let at = format!("{at}.required");
            for name in as_sequence(required, &at)? {
                let name = name.as_str().ok_or_else(|| LoadError::Shape {
                    at: at.clone(),
                    expected: "a list of strings",
                })?;
                schema.required.push(name.to_string());
            }
        }

        if let Some(properties) = node.get("properties") {
            for (name, property) in as_mapping(properties, &format!("{at}.properties"))? {
                let name = key_string(name, at)?;
                let id = self.schema_ref(property, &format!("{at}.properties.{name}"))?;
                schema.properties.insert(name, id);
            }
        }

        if let Some(items) = node.get("items") {
            schema.items = Some(self.schema_ref(items, &format!("{at}.items"))?);
        }

        schema.all_of = self.subschemas(node, "allOf", at)?;
        schema.one_of = self.subschemas(node, "oneOf", at)?;
        schema.any_of = self.subschemas(node, "anyOf", at)?;

        Ok(schema)
    }

    fn subschemas(
        &mut self,
        node: &'a Value,
        key: &str,
        at: &str,
    ) -> Result<Vec<SchemaId>, LoadError> {
        let Some(branches) = node.get(key) else {
            return Ok(Vec::new());
        };
        as_sequence(branches, &format!("{at}.{key}"))?
            .iter()
            .enumerate()
            .map(|(i, branch)| self.schema_ref(branch, &format!("{at}.{key}[{i}]")))
            .collect()
    }
}

//==============================================================================
// Node Helpers
//==============================================================================

fn as_mapping<'v>(node: &'v Value, at: &str) -> Result<&'v serde_yaml::Mapping, LoadError> {
    node.as_mapping().ok_or_else(|| LoadError::Shape {
        at: at.to_string(),
        expected: "a mapping",
    })
}

fn as_sequence<'v>(node: &'v Value, at: &str) -> Result<&'v Vec<Value>, LoadError> {
    node.as_sequence().ok_or_else(|| LoadError::Shape {
        at: at.to_string(),
        expected: "a list",
    })
}

/// Mapping keys may be numbers in YAML (`200:`), so they are stringified.
fn key_string(key: &Value, at: &str) -> Result<String, LoadError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(LoadError::Shape {
            at: at.to_string(),
            expected: "keyed by strings",
        }),
    }
}

fn opt_string(node: &Value, key: &str, at: &str) -> Result<Option<String>, LoadError> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LoadError::Shape {
            at: format!("{at}.{key}"),
            expected: "a string",
        }),
    }
}

fn opt_bool(node: &Value, key: &str, at: &str) -> Result<bool, LoadError> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(LoadError::Shape {
            at: format!("{at}.{key}"),
            expected: "a boolean",
        }),
    }
}

fn ref_target<'v>(node: &'v Value, at: &str) -> Result<Option<&'v str>, LoadError> {
    match node.get("$ref") {
        None => Ok(None),
        Some(Value::String(target)) => Ok(Some(target.as_str())),
        Some(_) => Err(LoadError::Shape {
            at: format!("{at}.$ref"),
            expected: "a string",
        }),
    }
}

fn local_ref<'r>(target: &'r str, prefix: &str) -> Result<&'r str, LoadError> {
    if !target.starts_with('#') {
        return Err(LoadError::ExternalRef(target.to_string()));
    }
    target
        .strip_prefix(prefix)
        .ok_or_else(|| LoadError::UnresolvedRef(target.to_string()))
}

fn extensions(node: &Value, at: &str) -> Result<IndexMap<String, serde_json::Value>, LoadError> {
    let mut found = IndexMap::new();
    let Some(mapping) = node.as_mapping() else {
        return Ok(found);
    };
    for (key, value) in mapping {
        if let Some(name) = key.as_str().filter(|k| k.starts_with("x-")) {
            found.insert(name.to_string(), to_json(value, at)?);
        }
    }
    Ok(found)
}

fn to_json(value: &Value, at: &str) -> Result<serde_json::Value, LoadError> {
    serde_json::to_value(value).map_err(|_| LoadError::Shape {
        at: at.to_string(),
        expected: "representable as JSON",
    })
}
