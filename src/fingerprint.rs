//! Semantic fingerprints of contract documents.

use crate::error::LoadError;
use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Generates a semantic fingerprint for a YAML or JSON contract.
///
/// The fingerprint is a SHA-256 hash of the document's canonical JSON form
/// with every mapping's keys sorted. It is insensitive to comments,
/// formatting, key order, and the choice between YAML and JSON.
pub fn generate_fingerprint(content: &str) -> Result<String, LoadError> {
    let root: Yaml = serde_yaml::from_str(content)?;
    Ok(hash_hex(canonical(&root).to_string().as_bytes()))
}

/// Combines per-fragment fingerprints, keyed by a stable fragment name, into
/// one fingerprint.
pub fn combine_fingerprints<'a>(fragments: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let sorted: BTreeMap<&str, &str> = fragments.into_iter().collect();
    let mut hasher = Sha256::new();
    for (name, fingerprint) in sorted {
        hasher.update(name.as_bytes());
        hasher.update([0]);
        hasher.update(fingerprint.as_bytes());
        hasher.update([0]);
    }
    format!("{:x}", hasher.finalize())
}

fn hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn canonical(value: &Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Json::Null, Json::Number)
            }
        }
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(items) => Json::Array(items.iter().map(canonical).collect()),
        Yaml::Mapping(mapping) => {
            let sorted: BTreeMap<String, Json> = mapping
                .iter()
                .map(|(key, value)| (key_text(key), canonical(value)))
                .collect();
            Json::Object(sorted.into_iter().collect::<Map<_, _>>())
        }
        Yaml::Tagged(tagged) => canonical(&tagged.value),
    }
}

fn key_text(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        other => canonical(other).to_string(),
    }
}
