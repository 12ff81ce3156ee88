//! API-level rules: removed paths and operations, stability downgrades

use crate::compat::engine::CheckConfig;
use crate::compat::handlers::create_finding;
use crate::compat::messages::quote;
use crate::compat::types::{Finding, Level};
use crate::contract::OperationRef;
use crate::diff::{Diff, OperationsSourcesMap, STABILITY_LEVEL_EXTENSION};

pub const API_PATH_REMOVED_WITHOUT_DEPRECATION_ID: &str = "api-path-removed-without-deprecation";
pub const API_REMOVED_WITHOUT_DEPRECATION_ID: &str = "api-removed-without-deprecation";
pub const API_STABILITY_DECREASED_ID: &str = "api-stability-decreased";

/// Stability levels from least to most stable
const STABILITY_LEVELS: &[&str] = &["draft", "alpha", "beta", "stable"];

/// Every operation of a removed path that was not deprecated first.
pub fn check_api_path_removed_without_deprecation(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();
    let Some(paths_diff) = &diff.paths_diff else {
        return changes;
    };

    for path in &paths_diff.deleted {
        let Some(path_item) = diff.base.paths.get(path) else {
            continue;
        };
        for (method, operation) in &path_item.operations {
            if operation.deprecated {
                continue;
            }
            changes.push(create_finding(
                API_PATH_REMOVED_WITHOUT_DEPRECATION_ID,
                Level::Err,
                config.message(API_PATH_REMOVED_WITHOUT_DEPRECATION_ID, &[]),
                method,
                path,
                sources.base_source(&OperationRef::new(path, method)),
            ));
        }
    }

    changes
}

/// Operations removed from a path that still exists, without deprecation.
pub fn check_api_removed_without_deprecation(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();
    let Some(paths_diff) = &diff.paths_diff else {
        return changes;
    };

    for (path, path_diff) in &paths_diff.modified {
        let Some(operations_diff) = &path_diff.operations_diff else {
            continue;
        };
        for method in &operations_diff.deleted {
            let op = OperationRef::new(path, method);
            if diff.base.operation(&op).is_some_and(|operation| operation.deprecated) {
                continue;
            }
            changes.push(create_finding(
                API_REMOVED_WITHOUT_DEPRECATION_ID,
                Level::Err,
                config.message(API_REMOVED_WITHOUT_DEPRECATION_ID, &[]),
                method,
                path,
                sources.base_source(&op),
            ));
        }
    }

    changes
}

/// `x-stability-level` moved towards `draft`. Unknown levels are ignored.
pub fn check_api_stability_decreased(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();
    if !config.is_extension_included(STABILITY_LEVEL_EXTENSION) {
        return changes;
    }

    for (path, operation, method_diff) in diff.modified_operations() {
        let Some(level_diff) = method_diff
            .extensions_diff
            .as_ref()
            .and_then(|extensions| extensions.modified.get(STABILITY_LEVEL_EXTENSION))
        else {
            continue;
        };
        let (Some(from), Some(to)) = (level_diff.from.as_str(), level_diff.to.as_str()) else {
            continue;
        };
        let (Some(from_rank), Some(to_rank)) = (stability_rank(from), stability_rank(to)) else {
            continue;
        };
        if to_rank >= from_rank {
            continue;
        }
        changes.push(create_finding(
            API_STABILITY_DECREASED_ID,
            Level::Err,
            config.message(API_STABILITY_DECREASED_ID, &[quote(from), quote(to)]),
            operation,
            path,
            sources.revision_source(&method_diff.revision),
        ));
    }

    changes
}

fn stability_rank(level: &str) -> Option<usize> {
    STABILITY_LEVELS.iter().position(|known| *known == level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::test_support::check;

    const BASE: &str = r#"
paths:
  /pets:
    get:
      x-stability-level: stable
      responses:
        "200":
          description: ok
    delete:
      responses:
        "204":
          description: gone
  /legacy:
    get:
      deprecated: true
    post: {}
"#;

    #[test]
    fn test_api_path_removed_without_deprecation() {
        let revision = r#"
paths:
  /pets:
    get:
      x-stability-level: stable
      responses:
        "200":
          description: ok
    delete:
      responses:
        "204":
          description: gone
"#;
        let changes = check(check_api_path_removed_without_deprecation, BASE, revision);
        // The deprecated GET is allowed to go; POST is not.
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "/legacy");
        assert_eq!(changes[0].operation, "POST");
        assert_eq!(changes[0].source, "base.yaml");
    }

    #[test]
    fn test_api_removed_without_deprecation() {
        let revision = BASE.replace(
            "    delete:\n      responses:\n        \"204\":\n          description: gone\n",
            "",
        );
        let changes = check(check_api_removed_without_deprecation, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].operation, "DELETE");
        assert_eq!(changes[0].text, "api removed without deprecation");

        let deprecated = BASE.replace("    delete:\n", "    delete:\n      deprecated: true\n");
        let revision = deprecated.replace(
            "    delete:\n      deprecated: true\n      responses:\n        \"204\":\n          description: gone\n",
            "",
        );
        assert!(check(check_api_removed_without_deprecation, &deprecated, &revision).is_empty());
    }

    #[test]
    fn test_api_stability_decreased() {
        let revision = BASE.replace("x-stability-level: stable", "x-stability-level: beta");
        let changes = check(check_api_stability_decreased, BASE, &revision);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].text, "stability level decreased from 'stable' to 'beta'");

        // Promotion is fine.
        assert!(check(check_api_stability_decreased, &revision, BASE).is_empty());
    }

    #[test]
    fn test_unknown_stability_level_ignored() {
        let revision = BASE.replace("x-stability-level: stable", "x-stability-level: experimental");
        assert!(check(check_api_stability_decreased, BASE, &revision).is_empty());
    }
}
