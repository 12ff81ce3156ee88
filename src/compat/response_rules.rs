//! Response rules

use crate::compat::engine::CheckConfig;
use crate::compat::handlers::create_finding;
use crate::compat::messages::quote;
use crate::compat::types::{Finding, Level};
use crate::diff::{Diff, OperationsSourcesMap};

pub const RESPONSE_MEDIA_TYPE_REMOVED_ID: &str = "response-media-type-removed";

/// A media type dropped from a response that still exists.
pub fn check_response_media_type_removed(
    diff: &Diff,
    sources: &OperationsSourcesMap,
    config: &CheckConfig,
) -> Vec<Finding> {
    let mut changes = Vec::new();

    for (path, operation, method_diff) in diff.modified_operations() {
        let Some(responses_diff) = &method_diff.responses_diff else {
            continue;
        };
        let source = sources.revision_source(&method_diff.revision);
        for (status, response_diff) in &responses_diff.modified {
            let Some(content_diff) = &response_diff.content_diff else {
                continue;
            };
            for media_type in &content_diff.media_type_deleted {
                changes.push(create_finding(
                    RESPONSE_MEDIA_TYPE_REMOVED_ID,
                    Level::Err,
                    config.message(
                        RESPONSE_MEDIA_TYPE_REMOVED_ID,
                        &[quote(media_type), quote(status)],
                    ),
                    operation,
                    path,
                    source,
                ));
            }
        }
    }

    changes
}
