//! Static rule registry
//!
//! Every rule is a pure function over the diff. Adding a rule means writing
//! the function and listing it here; the engine needs no change.

use crate::compat::categories::RuleCategory;
use crate::compat::engine::CheckConfig;
use crate::compat::messages;
use crate::compat::types::Finding;
use crate::compat::{api_rules, enum_rules, request_rules, response_rules};
use crate::diff::{Diff, OperationsSourcesMap};

/// Signature shared by all rules
pub type RuleFn = fn(&Diff, &OperationsSourcesMap, &CheckConfig) -> Vec<Finding>;

/// Master rule registry
pub fn get_rule_mapping() -> &'static [(&'static str, RuleCategory, RuleFn)] {
    RULES
}

const RULES: &[(&str, RuleCategory, RuleFn)] = &[
    // API rules (3 rules)
    (
        api_rules::API_PATH_REMOVED_WITHOUT_DEPRECATION_ID,
        RuleCategory::Api,
        api_rules::check_api_path_removed_without_deprecation,
    ),
    (
        api_rules::API_REMOVED_WITHOUT_DEPRECATION_ID,
        RuleCategory::Api,
        api_rules::check_api_removed_without_deprecation,
    ),
    (
        api_rules::API_STABILITY_DECREASED_ID,
        RuleCategory::Api,
        api_rules::check_api_stability_decreased,
    ),
    // REQUEST rules (8 rules)
    (
        request_rules::NEW_REQUIRED_REQUEST_PROPERTY_ID,
        RuleCategory::Request,
        request_rules::check_new_required_request_property,
    ),
    (
        enum_rules::REQUEST_BODY_BECAME_ENUM_ID,
        RuleCategory::Request,
        enum_rules::check_request_body_became_enum,
    ),
    (
        request_rules::REQUEST_BODY_BECAME_REQUIRED_ID,
        RuleCategory::Request,
        request_rules::check_request_body_became_required,
    ),
    (
        enum_rules::REQUEST_BODY_ENUM_VALUE_REMOVED_ID,
        RuleCategory::Request,
        enum_rules::check_request_body_enum_value_removed,
    ),
    (
        request_rules::REQUEST_BODY_TYPE_CHANGED_ID,
        RuleCategory::Request,
        request_rules::check_request_body_type_changed,
    ),
    (
        enum_rules::REQUEST_PROPERTY_BECAME_ENUM_ID,
        RuleCategory::Request,
        enum_rules::check_request_property_became_enum,
    ),
    (
        enum_rules::REQUEST_PROPERTY_ENUM_VALUE_REMOVED_ID,
        RuleCategory::Request,
        enum_rules::check_request_property_enum_value_removed,
    ),
    (
        request_rules::REQUEST_PROPERTY_TYPE_CHANGED_ID,
        RuleCategory::Request,
        request_rules::check_request_property_type_changed,
    ),
    // RESPONSE rules (2 rules)
    (
        response_rules::RESPONSE_MEDIA_TYPE_REMOVED_ID,
        RuleCategory::Response,
        response_rules::check_response_media_type_removed,
    ),
    (
        enum_rules::RESPONSE_PROPERTY_ENUM_VALUE_ADDED_ID,
        RuleCategory::Response,
        enum_rules::check_response_property_enum_value_added,
    ),
];

/// Get count of all registered rules
pub const fn get_rule_count() -> usize {
    RULES.len()
}

/// Verify rule consistency: unique ids, each with a built-in template
pub fn verify_rules() -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for (rule_id, _, _) in RULES {
        if !seen.insert(rule_id) {
            return Err(format!("Duplicate rule ID: {rule_id}"));
        }
        if messages::builtin_template(rule_id).is_none() {
            return Err(format!("Missing message template for rule: {rule_id}"));
        }
    }
    Ok(())
}
