//! Enum constraint rules
//!
//! Restricting a request value to an enumeration, or removing a value from
//! one, rejects requests that used to be valid. Adding a value to a response
//! enumeration may surprise clients that switch over the known values.

use crate::compat::engine::CheckConfig;
use crate::compat::handlers::create_finding;
use crate::compat::messages::{quote, quote_value};
use crate::compat::types::{Finding, Level};
use crate::compat::walker::{check_modified_properties_diff, property_full_name};
use crate::diff::{Diff, EXTENSIBLE_ENUM_EXTENSION, OperationsSourcesMap};

pub const REQUEST_BODY_BECAME_ENUM_ID: &str = "request-body-became-enum";
pub const REQUEST_PROPERTY_BECAME_ENUM_ID: &str = "request-property-became-enum";
pub const REQUEST_BODY_ENUM_VALUE_REMOVED_ID: &str = "request-body-enum-value-removed";
pub const REQUEST_PROPERTY_ENUM_VALUE_REMOVED_ID: &str = "request-property-enum-value-removed";
pub const RESPONSE_PROPERTY_ENUM_VALUE_ADDED_ID: &str = "response-property-enum-value-added";

// ========================================
// Request body
// ========================================

/// Request body schema gained an enumeration, one finding per media type.
pub fn check_request_body_became_enum(
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
            if !schema_diff.enum_added() {
                continue;
            }
            changes.push(create_finding(
                REQUEST_BODY_BECAME_ENUM_ID,
                Level::Err,
                config.message(REQUEST_BODY_BECAME_ENUM_ID, &[]),
                operation,
                path,
                source,
            ));
        }
    }

    changes
}

/// Values removed from the request body's own enumeration.
pub fn check_request_body_enum_value_removed(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let source = sources.revision_source(&method_diff.revision);
        for (_, media_type) in method_diff.request_media_types() {
            let Some(enum_diff) = media_type
                .schema_diff
                .as_ref()
                .and_then(|schema_diff| schema_diff.enum_diff.as_ref())
            else {
                continue;
            };
            for value in &enum_diff.deleted {
                changes.push(create_finding(
                    REQUEST_BODY_ENUM_VALUE_REMOVED_ID,
                    Level::Err,
                    config.message(REQUEST_BODY_ENUM_VALUE_REMOVED_ID, &[quote_value(value)]),
                    operation,
                    path,
                    source,
                ));
            }
        }
    }

    changes
}

// ========================================
// Request properties
// ========================================

/// A nested request property gained an enumeration.
pub fn check_request_property_became_enum(
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
                if !property_diff.enum_added() {
                    return;
                }
                let property = property_full_name(prefix, name);
                changes.push(create_finding(
                    REQUEST_PROPERTY_BECAME_ENUM_ID,
                    Level::Err,
                    config.message(REQUEST_PROPERTY_BECAME_ENUM_ID, &[quote(&property)]),
                    operation,
                    path,
                    source,
                ));
            });
        }
    }

    changes
}

/// Values removed from a nested request property's enumeration.
pub fn check_request_property_enum_value_removed(
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
                let Some(enum_diff) = &property_diff.enum_diff else {
                    return;
                };
                let property = property_full_name(prefix, name);
                for value in &enum_diff.deleted {
                    changes.push(create_finding(
                        REQUEST_PROPERTY_ENUM_VALUE_REMOVED_ID,
                        Level::Err,
                        config.message(
                            REQUEST_PROPERTY_ENUM_VALUE_REMOVED_ID,
                            &[quote_value(value), quote(&property)],
                        ),
                        operation,
                        path,
                        source,
                    ));
                }
            });
        }
    }

    changes
}

// ========================================
// Response properties
// ========================================

/// Values added to a response property's enumeration. Properties marked
/// `x-extensible-enum` already tell clients to expect unknown values.
pub fn check_response_property_enum_value_added(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();
    let honor_extensible = config.is_extension_included(EXTENSIBLE_ENUM_EXTENSION);

    for (path, operation, method_diff) in diff.modified_operations() {
        let source = sources.revision_source(&method_diff.revision);
        for (_, _, media_type) in method_diff.response_media_types() {
            let Some(schema_diff) = &media_type.schema_diff else {
                continue;
            };
            check_modified_properties_diff(schema_diff, |prefix, name, property_diff, _| {
                let Some(enum_diff) = &property_diff.enum_diff else {
                    return;
                };
                if honor_extensible
                    && property_diff.revision.is_some_and(|id| {
                        diff.revision
                            .schema(id)
                            .extensions
                            .contains_key(EXTENSIBLE_ENUM_EXTENSION)
                    })
                {
                    return;
                }
                let property = property_full_name(prefix, name);
                for value in &enum_diff.added {
                    changes.push(create_finding(
                        RESPONSE_PROPERTY_ENUM_VALUE_ADDED_ID,
                        Level::Warn,
                        config.message(
                            RESPONSE_PROPERTY_ENUM_VALUE_ADDED_ID,
                            &[quote_value(value), quote(&property)],
                        ),
                        operation,
                        path,
                        source,
                    ));
                }
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::test_support::{check, check_with};

    const BODY_BASE: &str = r#"
paths:
  /widgets:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: string
"#;

    #[test]
    fn test_request_body_became_enum() {
        let revision = BODY_BASE.replace(
            "              type: string\n",
            "              type: string\n              enum: [GET, POST]\n",
        );
        let changes = check(check_request_body_became_enum, BODY_BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, REQUEST_BODY_BECAME_ENUM_ID);
        assert_eq!(changes[0].level, Level::Err);
        assert_eq!(changes[0].path, "/widgets");
        assert_eq!(changes[0].operation, "POST");
        assert_eq!(changes[0].source, "revision.yaml");
    }

    #[test]
    fn test_extended_enum_is_not_became_enum() {
        let base = BODY_BASE.replace(
            "              type: string\n",
            "              type: string\n              enum: [GET]\n",
        );
        let revision = BODY_BASE.replace(
            "              type: string\n",
            "              type: string\n              enum: [GET, POST]\n",
        );
        assert!(check(check_request_body_became_enum, &base, &revision).is_empty());
    }

    #[test]
    fn test_request_body_enum_value_removed() {
        let base = BODY_BASE.replace(
            "              type: string\n",
            "              type: string\n              enum: [GET, POST, PUT]\n",
        );
        let revision = BODY_BASE.replace(
            "              type: string\n",
            "              type: string\n              enum: [GET]\n",
        );
        let changes = check(check_request_body_enum_value_removed, &base, &revision);
        let texts: Vec<_> = changes.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "request body enum value removed 'POST'",
                "request body enum value removed 'PUT'"
            ]
        );
    }

    const NESTED_BASE: &str = r#"
paths:
  /orders:
    put:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                metadata:
                  type: object
                  properties:
                    status:
                      type: string
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  state:
                    type: string
                    enum: [open]
"#;

    #[test]
    fn test_request_property_became_enum_nested() {
        let revision = NESTED_BASE.replace(
            "                    status:\n                      type: string\n",
            "                    status:\n                      type: string\n                      enum: [active, inactive]\n",
        );
        let changes = check(check_request_property_became_enum, NESTED_BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].level, Level::Err);
        assert!(changes[0].text.contains("'metadata.status'"), "{}", changes[0].text);
        // The body itself did not become an enum.
        assert!(check(check_request_body_became_enum, NESTED_BASE, &revision).is_empty());
    }

    #[test]
    fn test_request_property_enum_value_removed() {
        let base = NESTED_BASE.replace(
            "                    status:\n                      type: string\n",
            "                    status:\n                      type: string\n                      enum: [a, b]\n",
        );
        let revision = NESTED_BASE.replace(
            "                    status:\n                      type: string\n",
            "                    status:\n                      type: string\n                      enum: [a]\n",
        );
        let changes = check(check_request_property_enum_value_removed, &base, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].text,
            "removed the enum value 'b' of the request property 'metadata.status'"
        );
    }

    #[test]
    fn test_response_property_enum_value_added() {
        let revision = NESTED_BASE.replace("enum: [open]", "enum: [open, closed]");
        let changes = check(check_response_property_enum_value_added, NESTED_BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].level, Level::Warn);
        assert_eq!(
            changes[0].text,
            "added the new 'closed' enum value to the 'state' response property"
        );
    }

    #[test]
    fn test_response_extensible_enum_skipped_when_included() {
        let base = NESTED_BASE.replace(
            "enum: [open]",
            "enum: [open]\n                    x-extensible-enum: true",
        );
        let revision = base.replace("enum: [open]", "enum: [open, closed]");
        assert!(check(check_response_property_enum_value_added, &base, &revision).is_empty());

        let config = CheckConfig {
            include_extensions: Vec::new(),
            ..Default::default()
        };
        let changes =
            check_with(&config, check_response_property_enum_value_added, &base, &revision);
        assert_eq!(changes.len(), 1);
    }
}
