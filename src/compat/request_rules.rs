//! Request body rules

use crate::compat::engine::CheckConfig;
use crate::compat::handlers::{create_finding, is_type_widening, type_and_format};
use crate::compat::messages::{quote, quote_opt};
use crate::compat::types::{Finding, Level};
use crate::compat::walker::{check_modified_properties_diff, property_full_name};
use crate::diff::{Diff, OperationsSourcesMap, SchemaDiff};

pub const REQUEST_BODY_BECAME_REQUIRED_ID: &str = "request-body-became-required";
pub const REQUEST_BODY_TYPE_CHANGED_ID: &str = "request-body-type-changed";
pub const REQUEST_PROPERTY_TYPE_CHANGED_ID: &str = "request-property-type-changed";
pub const NEW_REQUIRED_REQUEST_PROPERTY_ID: &str = "new-required-request-property";

/// Optional request body became required.
pub fn check_request_body_became_required(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let Some(required_diff) = method_diff
            .request_body_diff
            .as_ref()
            .and_then(|body| body.required_diff.as_ref())
        else {
            continue;
        };
        if required_diff.from || !required_diff.to {
            continue;
        }
        changes.push(create_finding(
            REQUEST_BODY_BECAME_REQUIRED_ID,
            Level::Err,
            config.message(REQUEST_BODY_BECAME_REQUIRED_ID, &[]),
            operation,
            path,
            sources.revision_source(&method_diff.revision),
        ));
    }

    changes
}

/// Top-level request body type or format changed.
pub fn check_request_body_type_changed(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let source = sources.revision_source(&method_diff.revision);
        for (_, media_type) in method_diff.request_media_types() {
            let Some(schema_diff) = &media_type.schema_diff else {
                continue;
            };
            let Some(args) = type_change_args(diff, schema_diff) else {
                continue;
            };
            changes.push(create_finding(
                REQUEST_BODY_TYPE_CHANGED_ID,
                Level::Err,
                config.message(REQUEST_BODY_TYPE_CHANGED_ID, &args),
                operation,
                path,
                source,
            ));
        }
    }

    changes
}

/// Nested request property type or format changed.
pub fn check_request_property_type_changed(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let source = sources.revision_source(&method_diff.revision);
        for (_, media_type) in method_diff.request_media_types() {
            let Some(schema_diff) = &media_type.schema_diff else {
                continue;
            };
            check_modified_properties_diff(schema_diff, |prefix, name, property_diff, _| {
                let Some(type_args) = type_change_args(diff, property_diff) else {
                    return;
                };
                let mut args = vec![quote(property_full_name(prefix, name))];
                args.extend(type_args);
                changes.push(create_finding(
                    REQUEST_PROPERTY_TYPE_CHANGED_ID,
                    Level::Err,
                    config.message(REQUEST_PROPERTY_TYPE_CHANGED_ID, &args),
                    operation,
                    path,
                    source,
                ));
            });
        }
    }

    changes
}

/// `[from type, from format, to type, to format]` when a request schema's
/// type or format changed in a way old requests may not satisfy.
fn type_change_args(diff: &Diff, schema_diff: &SchemaDiff) -> Option<Vec<String>> {
    if schema_diff.type_diff.is_none() && schema_diff.format_diff.is_none() {
        return None;
    }
    let (from_type, from_format) = type_and_format(&diff.base, schema_diff.base);
    let (to_type, to_format) = type_and_format(&diff.revision, schema_diff.revision);
    if schema_diff.format_diff.is_none() && is_type_widening(from_type, to_type) {
        return None;
    }
    Some(vec![
        quote_opt(from_type),
        quote_opt(from_format),
        quote_opt(to_type),
        quote_opt(to_format),
    ])
}

/// A property added to a request schema and to its `required` list at the
/// same time. Read-only properties are never sent by clients.
pub fn check_new_required_request_property(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let source = sources.revision_source(&method_diff.revision);
        for (_, media_type) in method_diff.request_media_types() {
            let Some(schema_diff) = &media_type.schema_diff else {
                continue;
            };
            let mut report = |property: String| {
                changes.push(create_finding(
                    NEW_REQUIRED_REQUEST_PROPERTY_ID,
                    Level::Err,
                    config.message(NEW_REQUIRED_REQUEST_PROPERTY_ID, &[quote(property)]),
                    operation,
                    path,
                    source,
                ));
            };

            for name in new_required_properties(diff, schema_diff) {
                report(name.to_string());
            }
            check_modified_properties_diff(schema_diff, |prefix, name, property_diff, _| {
                let parent = property_full_name(prefix, name);
                for name in new_required_properties(diff, property_diff) {
                    report(property_full_name(&parent, name));
                }
            });
        }
    }

    changes
}

fn new_required_properties<'d>(diff: &'d Diff, schema_diff: &'d SchemaDiff) -> Vec<&'d str> {
    let (Some(properties), Some(required), Some(revision_id)) = (
        &schema_diff.properties_diff,
        &schema_diff.required_diff,
        schema_diff.revision,
    ) else {
        return Vec::new();
    };
    let revision = diff.revision.schema(revision_id);
    properties
        .added
        .iter()
        .filter(|name| required.added.contains(*name))
        .filter(|name| {
            !revision
                .properties
                .get(name.as_str())
                .is_some_and(|id| diff.revision.schema(*id).read_only)
        })
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::test_support::check;

    const BASE: &str = r#"
paths:
  /users:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name:
                  type: string
                age:
                  type: integer
                address:
                  type: object
                  properties:
                    city:
                      type: string
"#;

    #[test]
    fn test_request_body_became_required() {
        let revision = BASE.replace(
            "      requestBody:\n",
            "      requestBody:\n        required: true\n",
        );
        let changes = check(check_request_body_became_required, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].text, "request body became required");

        // Relaxing is fine.
        assert!(check(check_request_body_became_required, &revision, BASE).is_empty());
    }

    #[test]
    fn test_request_body_type_changed() {
        let base = r#"
paths:
  /a:
    post:
      requestBody:
        content:
          text/plain:
            schema:
              type: string
"#;
        let revision = base.replace("type: string", "type: integer\n              format: int64");
        let changes = check(check_request_body_type_changed, base, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].text,
            "the request's body type/format changed from 'string'/'' to 'integer'/'int64'"
        );
    }

    #[test]
    fn test_request_property_type_changed_and_widening() {
        let revision = BASE.replace(
            "                city:\n                      type: string",
            "                city:\n                      type: integer",
        );
        let changes = check(check_request_property_type_changed, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].text.starts_with("the 'address.city' request property"));

        let widened = BASE.replace("type: integer", "type: number");
        assert!(check(check_request_property_type_changed, BASE, &widened).is_empty());
    }

    #[test]
    fn test_new_required_request_property() {
        let revision = BASE.replace(
            "              properties:\n                name:",
            "              required: [email]\n              properties:\n                email:\n                  type: string\n                name:",
        );
        let changes = check(check_new_required_request_property, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].text, "added the new required request property 'email'");
    }

    #[test]
    fn test_new_required_nested_and_optional() {
        let revision = BASE.replace(
            "                  properties:\n                    city:",
            "                  required: [zip]\n                  properties:\n                    zip:\n                      type: string\n                    street:\n                      type: string\n                    city:",
        );
        let changes = check(check_new_required_request_property, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].text.contains("'address.zip'"));
    }

    #[test]
    fn test_new_read_only_required_property_ignored() {
        let revision = BASE.replace(
            "              properties:\n                name:",
            "              required: [id]\n              properties:\n                id:\n                  type: string\n                  readOnly: true\n                name:",
        );
        assert!(check(check_new_required_request_property, BASE, &revision).is_empty());
    }
}
