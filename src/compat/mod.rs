//! Breaking change detection over a contract diff
//!
//! Rules are pure functions over the [`Diff`](crate::diff::Diff) tree,
//! listed in one static registry and run by [`BreakingEngine`].

pub mod api_rules;
pub mod categories;
pub mod engine;
pub mod enum_rules;
pub mod handlers;
pub mod messages;
pub mod request_rules;
pub mod response_rules;
pub mod rule_registry;
pub mod types;
pub mod walker;

pub use categories::RuleCategory;
pub use engine::{BreakingEngine, CheckConfig, CheckResult};
pub use types::{Finding, Level};
pub use walker::{check_modified_properties_diff, property_full_name};
