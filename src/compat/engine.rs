//! Breaking change detection engine
//!
//! Runs the selected rules of the static registry over one diff and
//! aggregates their findings.

use crate::compat::categories::RuleCategory;
use crate::compat::messages;
use crate::compat::rule_registry;
use crate::compat::types::{Finding, Level};
use crate::diff::{
    Diff, DiffConfig, EXTENSIBLE_ENUM_EXTENSION, OperationsSourcesMap, STABILITY_LEVEL_EXTENSION,
    SUNSET_EXTENSION,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Configuration for breaking change detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Categories to enable (if empty, all categories)
    pub use_categories: Vec<String>,
    /// Specific rules to enable (overrides categories if specified)
    pub use_rules: Vec<String>,
    /// Rules to explicitly disable
    pub except_rules: Vec<String>,
    /// Drop INFO findings
    pub breaking_only: bool,
    /// Extensions the diff compares; rules keyed on an extension only fire
    /// when it is included
    pub include_extensions: Vec<String>,
    /// Message template overrides by rule id
    pub messages: HashMap<String, String>,
}

impl CheckConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        #[derive(serde::Deserialize)]
        struct ConfigFile {
            breaking: Option<CheckConfig>,
        }

        let config_file: ConfigFile = serde_yaml::from_str(yaml)?;
        let config = config_file.breaking.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Rejects unknown category names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .use_categories
            .iter()
            .find(|category| RuleCategory::from_id(category).is_none())
        {
            Some(unknown) => Err(ConfigError::UnknownCategory(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Diff configuration comparing the extensions this config includes.
    pub fn diff_config(&self) -> DiffConfig {
        self.extend_diff_config(DiffConfig::new())
    }

    /// Adds the extensions this config includes to `diff_config`.
    pub fn extend_diff_config(&self, diff_config: DiffConfig) -> DiffConfig {
        self.include_extensions
            .iter()
            .fold(diff_config, |config, name| config.with_extension(name))
    }

    pub fn is_extension_included(&self, name: &str) -> bool {
        self.include_extensions.iter().any(|included| included == name)
    }

    /// Template for a rule id: override first, then built-in.
    pub fn template(&self, id: &str) -> Option<&str> {
        self.messages
            .get(id)
            .map(String::as_str)
            .or_else(|| messages::builtin_template(id))
    }

    /// Renders the message of a finding. A missing template renders the raw
    /// id followed by the arguments.
    pub fn message(&self, id: &str, args: &[String]) -> String {
        match self.template(id) {
            Some(template) => messages::render(template, args),
            None => {
                warn!(rule = id, "no message template, rendering raw rule id");
                messages::fallback(id, args)
            }
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            use_categories: Vec::new(),
            use_rules: Vec::new(),
            except_rules: Vec::new(),
            breaking_only: false,
            include_extensions: vec![
                STABILITY_LEVEL_EXTENSION.to_string(),
                SUNSET_EXTENSION.to_string(),
                EXTENSIBLE_ENUM_EXTENSION.to_string(),
            ],
            messages: HashMap::new(),
        }
    }
}

/// Result of breaking change detection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckResult {
    /// All findings, sorted by path, operation, rule id, and text
    pub changes: Vec<Finding>,
    /// Whether any ERR finding was reported
    pub has_breaking_changes: bool,
    /// Finding count by level
    pub summary: BTreeMap<Level, usize>,
    /// Rules that were executed
    pub executed_rules: Vec<String>,
}

impl CheckResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add findings to the result
    pub fn add_changes(&mut self, new_changes: Vec<Finding>) {
        for change in &new_changes {
            *self.summary.entry(change.level).or_insert(0) += 1;
            self.has_breaking_changes |= change.level == Level::Err;
        }
        self.changes.extend(new_changes);
    }

    /// Mark a rule as executed
    pub fn mark_rule_executed(&mut self, rule_id: String) {
        self.executed_rules.push(rule_id);
    }

    /// Findings at or above `level`.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.summary
            .range(level..)
            .map(|(_, count)| count)
            .sum()
    }

    fn sort(&mut self) {
        self.changes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.operation.cmp(&b.operation))
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.text.cmp(&b.text))
        });
    }
}

/// Main engine for breaking change detection
#[derive(Debug, Default)]
pub struct BreakingEngine {}

impl BreakingEngine {
    /// Create a new breaking change engine
    pub fn new() -> Self {
        Self {}
    }

    /// Runs every selected rule over `diff`.
    pub fn check(
        &self,
        diff: &Diff,
        sources: &OperationsSourcesMap,
        config: &CheckConfig,
    ) -> CheckResult {
        let mut result = CheckResult::new();

        for (rule_id, category, rule_fn) in rule_registry::get_rule_mapping() {
            if !is_selected(rule_id, *category, config) {
                continue;
            }

            let mut changes = rule_fn(diff, sources, config);
            if config.breaking_only {
                changes.retain(|change| change.level > Level::Info);
            }
            debug!(rule = rule_id, findings = changes.len(), "rule executed");

            result.mark_rule_executed(rule_id.to_string());
            result.add_changes(changes);
        }

        result.sort();
        info!(
            rules = result.executed_rules.len(),
            findings = result.changes.len(),
            breaking = result.has_breaking_changes,
            "breaking change check complete"
        );
        result
    }

    /// Get rule count from the registry
    pub fn get_rule_count(&self) -> usize {
        rule_registry::get_rule_count()
    }

    /// Verify registry integrity
    pub fn verify_rules(&self) -> Result<(), String> {
        rule_registry::verify_rules()
    }
}

fn is_selected(rule_id: &str, category: RuleCategory, config: &CheckConfig) -> bool {
    if config.except_rules.iter().any(|id| id == rule_id) {
        return false;
    }
    if !config.use_rules.is_empty() {
        return config.use_rules.iter().any(|id| id == rule_id);
    }
    config.use_categories.is_empty()
        || config
            .use_categories
            .iter()
            .any(|id| id == category.id())
}
