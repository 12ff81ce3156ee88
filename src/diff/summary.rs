//! Counts of top-level changes, for a quick overview of a diff.

use crate::diff::model::Diff;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub diff: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub details: IndexMap<String, SummaryDetails>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryDetails {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
}

impl Diff {
    /// Summarises added/deleted/modified paths and endpoints.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            diff: !self.is_empty(),
            ..Default::default()
        };
        let Some(paths) = &self.paths_diff else {
            return summary;
        };

        summary.details.insert(
            "paths".to_string(),
            SummaryDetails {
                added: paths.added.len(),
                deleted: paths.deleted.len(),
                modified: paths.modified.len(),
            },
        );

        let mut endpoints = SummaryDetails::default();
        for path in &paths.added {
            endpoints.added += self.revision.paths[path].operations.len();
        }
        for path in &paths.deleted {
            endpoints.deleted += self.base.paths[path].operations.len();
        }
        for ops in paths.modified.values().filter_map(|p| p.operations_diff.as_ref()) {
            endpoints.added += ops.added.len();
            endpoints.deleted += ops.deleted.len();
            endpoints.modified += ops.modified.len();
        }
        summary.details.insert("endpoints".to_string(), endpoints);

        summary
    }
}

#[cfg(test)]
mod tests {
    use crate::diff::{DiffConfig, get};
    use crate::load;
    use std::sync::Arc;

    #[test]
    fn test_summary_counts_endpoints() {
        let base = "paths:\n  /a:\n    get: {}\n    put: {}\n  /gone:\n    get: {}\n    post: {}\n";
        let revision = "paths:\n  /a:\n    get:\n      deprecated: true\n  /new:\n    get: {}\n";
        let diff = get(
            &DiffConfig::new(),
            Arc::new(load::from_str(base).unwrap()),
            Arc::new(load::from_str(revision).unwrap()),
        );

        let summary = diff.summary();

        assert!(summary.diff);
        let paths = summary.details["paths"];
        assert_eq!((paths.added, paths.deleted, paths.modified), (1, 1, 1));
        let endpoints = summary.details["endpoints"];
        assert_eq!((endpoints.added, endpoints.deleted, endpoints.modified), (1, 3, 1));
    }
}
