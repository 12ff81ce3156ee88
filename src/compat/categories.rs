//! Rule categories used to select groups of rules

use serde::{Deserialize, Serialize};

/// Breaking change categories that group related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// API category - paths and operations appearing, disappearing, or changing status
    Api,
    /// REQUEST category - constraints on what clients send
    Request,
    /// RESPONSE category - promises about what the server returns
    Response,
}

impl RuleCategory {
    /// Get the string identifier for this category
    pub fn id(&self) -> &'static str {
        match self {
            RuleCategory::Api => "API",
            RuleCategory::Request => "REQUEST",
            RuleCategory::Response => "RESPONSE",
        }
    }

    /// Parse category from string ID
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "API" => Some(RuleCategory::Api),
            "REQUEST" => Some(RuleCategory::Request),
            "RESPONSE" => Some(RuleCategory::Response),
            _ => None,
        }
    }

    /// Get all available categories
    pub fn all() -> Vec<Self> {
        vec![RuleCategory::Api, RuleCategory::Request, RuleCategory::Response]
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("Unknown rule category: {s}"))
    }
}
