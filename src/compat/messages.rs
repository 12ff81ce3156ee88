//! Localized finding messages.
//!
//! Templates use sequential `{}` slots filled from the rule's arguments in
//! order. Rules quote the values they pass, so a rendered message reads
//! `added the new required request property 'metadata.status'`.

use serde_json::Value;

/// Built-in English templates keyed by rule id.
const EN_MESSAGES: &[(&str, &str)] = &[
    (
        "api-path-removed-without-deprecation",
        "api path removed without deprecation",
    ),
    ("api-removed-without-deprecation", "api removed without deprecation"),
    ("api-stability-decreased", "stability level decreased from {} to {}"),
    (
        "new-required-request-property",
        "added the new required request property {}",
    ),
    (
        "request-body-became-enum",
        "request body was restricted to a list of enum values",
    ),
    ("request-body-became-required", "request body became required"),
    (
        "request-body-enum-value-removed",
        "request body enum value removed {}",
    ),
    (
        "request-body-type-changed",
        "the request's body type/format changed from {}/{} to {}/{}",
    ),
    (
        "request-property-became-enum",
        "request property {} was restricted to a list of enum values",
    ),
    (
        "request-property-enum-value-removed",
        "removed the enum value {} of the request property {}",
    ),
    (
        "request-property-type-changed",
        "the {} request property type/format changed from {}/{} to {}/{}",
    ),
    (
        "response-media-type-removed",
        "removed the media type {} for the response with the status {}",
    ),
    (
        "response-property-enum-value-added",
        "added the new {} enum value to the {} response property",
    ),
];

/// Returns the built-in English template for a rule id.
pub fn builtin_template(id: &str) -> Option<&'static str> {
    EN_MESSAGES
        .iter()
        .find(|(rule_id, _)| *rule_id == id)
        .map(|(_, template)| *template)
}

/// Fills the `{}` slots of `template` with `args`, in order.
///
/// Slots without a matching argument stay as `{}`; surplus arguments are
/// ignored.
pub fn render(template: &str, args: &[String]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(slot) = rest.find("{}") {
        rendered.push_str(&rest[..slot]);
        match args.next() {
            Some(arg) => rendered.push_str(arg),
            None => rendered.push_str("{}"),
        }
        rest = &rest[slot + 2..];
    }
    rendered.push_str(rest);
    rendered
}

/// Renders a message for an id with no template: the raw id followed by
/// the arguments.
pub fn fallback(id: &str, args: &[String]) -> String {
    if args.is_empty() {
        id.to_string()
    } else {
        format!("{id} {}", args.join(" "))
    }
}

/// Wraps a value in single quotes.
pub fn quote(value: impl std::fmt::Display) -> String {
    format!("'{value}'")
}

/// Quotes an enum value; strings render without their JSON quotes.
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        other => quote(other),
    }
}

/// Quotes an optional scalar such as a schema type, rendering absence as
/// an empty string.
pub fn quote_opt(value: Option<&str>) -> String {
    quote(value.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_sequential_slots() {
        let text = render(
            "removed the enum value {} of the request property {}",
            &[quote("b"), quote("metadata.status")],
        );
        assert_eq!(
            text,
            "removed the enum value 'b' of the request property 'metadata.status'"
        );
    }

    #[test]
    fn test_render_missing_and_surplus_args() {
        assert_eq!(render("{} and {}", &["x".to_string()]), "x and {}");
        assert_eq!(render("none", &["x".to_string()]), "none");
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value(&json!("GET")), "'GET'");
        assert_eq!(quote_value(&json!(3)), "'3'");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(fallback("custom-rule", &[]), "custom-rule");
        assert_eq!(
            fallback("custom-rule", &[quote("a"), quote("b")]),
            "custom-rule 'a' 'b'"
        );
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin_template("request-body-became-enum").is_some());
        assert!(builtin_template("no-such-rule").is_none());
    }
}
