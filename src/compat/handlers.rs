//! Helpers shared by rule implementations

use crate::compat::types::{Finding, Level};
use crate::contract::{Document, SchemaId};

/// Creates a finding located at one operation.
pub fn create_finding(
    id: &str,
    level: Level,
    text: String,
    operation: &str,
    path: &str,
    source: &str,
) -> Finding {
    Finding {
        id: id.to_string(),
        level,
        text,
        operation: operation.to_string(),
        path: path.to_string(),
        source: source.to_string(),
    }
}

/// `type` and `format` of a schema, if any.
pub fn type_and_format(document: &Document, id: Option<SchemaId>) -> (Option<&str>, Option<&str>) {
    match id {
        Some(id) => {
            let schema = document.schema(id);
            (schema.type_name.as_deref(), schema.format.as_deref())
        }
        None => (None, None),
    }
}

/// Changing `integer` to `number` widens what a request may carry.
pub fn is_type_widening(from: Option<&str>, to: Option<&str>) -> bool {
    matches!((from, to), (Some("integer"), Some("number")))
}
