//! Core types for breaking change detection

use serde::{Deserialize, Serialize};

/// One reported compatibility issue.
///
/// Created only by rule functions and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable rule identifier, e.g. `request-property-became-enum`
    pub id: String,
    pub level: Level,
    /// Rendered, localized message
    pub text: String,
    /// Upper-case HTTP method
    pub operation: String,
    pub path: String,
    /// Document or fragment that defined the operation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// Severity of a finding. Ordered `Info < Warn < Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Informational, not breaking
    Info,
    /// Possibly breaking, depending on how clients consume the API
    Warn,
    /// Breaking
    Err,
}

impl Level {
    pub fn id(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Err => "ERR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    // `Self::Err` would name the `Level::Err` variant here.
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERR" | "ERROR" => Ok(Level::Err),
            _ => Err(format!("Unknown level: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Err);
    }

    #[test]
    fn test_level_parse_and_serialize() {
        assert_eq!("err".parse::<Level>(), Ok(Level::Err));
        assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
        assert!("fatal".parse::<Level>().is_err());
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"WARN\"");
    }
}
