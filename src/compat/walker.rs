//! Property-tree walker shared by rules that inspect nested properties.

use crate::diff::SchemaDiff;
use std::collections::HashSet;

/// Invokes `visit(property_path, property_name, property_diff, parent_diff)`
/// once for every modified property reachable from `schema_diff`.
///
/// Depth-first and pre-order. Object properties extend the path with
/// `.name`, array items with `[]`; composition branches keep the path of
/// the schema they belong to. Added and deleted properties are not visited.
/// `property_path` is the path of the parent; combine it with the name via
/// [`property_full_name`].
pub fn check_modified_properties_diff<'d, F>(schema_diff: &'d SchemaDiff, mut visit: F)
where
    F: FnMut(&str, &str, &'d SchemaDiff, &'d SchemaDiff),
{
    let mut on_path = HashSet::new();
    walk(schema_diff, "", &mut on_path, &mut visit);
}

/// Joins a parent path and a property name with a dot.
pub fn property_full_name(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn walk<'d, F>(
    schema_diff: &'d SchemaDiff,
    path: &str,
    on_path: &mut HashSet<*const SchemaDiff>,
    visit: &mut F,
) where
    F: FnMut(&str, &str, &'d SchemaDiff, &'d SchemaDiff),
{
    let node: *const SchemaDiff = schema_diff;
    if !on_path.insert(node) {
        return;
    }

    if let Some(properties) = &schema_diff.properties_diff {
        for (name, property_diff) in &properties.modified {
            visit(path, name.as_str(), property_diff, schema_diff);
            walk(property_diff, &property_full_name(path, name), on_path, visit);
        }
    }

    if let Some(items) = &schema_diff.items_diff {
        walk(items, &format!("{path}[]"), on_path, visit);
    }

    for branch in schema_diff.modified_branches() {
        walk(branch, path, on_path, visit);
    }

    on_path.remove(&node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{SchemasDiff, SubschemasDiff};
    use indexmap::IndexMap;

    fn with_properties(props: Vec<(&str, SchemaDiff)>) -> SchemaDiff {
        SchemaDiff {
            properties_diff: Some(SchemasDiff {
                modified: props
                    .into_iter()
                    .map(|(name, diff)| (name.to_string(), diff))
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn leaf() -> SchemaDiff {
        SchemaDiff {
            nullable_diff: Some(crate::diff::ValueDiff {
                from: false,
                to: true,
            }),
            ..Default::default()
        }
    }

    fn collect(schema_diff: &SchemaDiff) -> Vec<String> {
        let mut visited = Vec::new();
        check_modified_properties_diff(schema_diff, |path, name, _, _| {
            visited.push(property_full_name(path, name));
        });
        visited
    }

    #[test]
    fn test_nested_properties_pre_order() {
        let root = with_properties(vec![
            ("address", with_properties(vec![("city", leaf())])),
            ("name", leaf()),
        ]);
        assert_eq!(collect(&root), vec!["address", "address.city", "name"]);
    }

    #[test]
    fn test_array_items_and_branches() {
        let items = SchemaDiff {
            items_diff: Some(Box::new(with_properties(vec![("sku", leaf())]))),
            ..Default::default()
        };
        let mut modified = IndexMap::new();
        modified.insert(0, with_properties(vec![("kind", leaf())]));
        let root = SchemaDiff {
            one_of_diff: Some(SubschemasDiff {
                modified,
                ..Default::default()
            }),
            ..with_properties(vec![("items", items)])
        };
        assert_eq!(collect(&root), vec!["items", "items[].sku", "kind"]);
    }

    #[test]
    fn test_parent_is_owning_schema() {
        let root = with_properties(vec![("metadata", with_properties(vec![("status", leaf())]))]);
        let mut parents = Vec::new();
        check_modified_properties_diff(&root, |_, name, _, parent| {
            let siblings = parent.properties_diff.as_ref().unwrap().modified.len();
            parents.push((name.to_string(), siblings));
        });
        assert_eq!(parents, vec![("metadata".to_string(), 1), ("status".to_string(), 1)]);
    }

    #[test]
    fn test_empty_schema_visits_nothing() {
        assert!(collect(&SchemaDiff::default()).is_empty());
    }
}
