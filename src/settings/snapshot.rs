/// Configuration snapshot as exchanged with `GET/POST /config`.
///
/// The service stores its settings in an INI file, so every value is
/// conceptually a string. Some values reach the wire as native JSON
/// booleans or numbers after the service's own type coercion; they are
/// normalized to their textual form here so the rest of the crate only ever
/// sees strings. Booleans use the `True` / `False` tokens the service writes
/// back to its INI file.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub const TRUE_TOKEN: &str = "True";
pub const FALSE_TOKEN: &str = "False";

/// Encode a boolean the way the service expects it.
pub fn encode_bool(value: bool) -> &'static str {
    if value { TRUE_TOKEN } else { FALSE_TOKEN }
}

/// Decode the `True` / `False` tokens. Anything else is not a boolean.
pub fn decode_bool(raw: &str) -> Option<bool> {
    match raw {
        TRUE_TOKEN => Some(true),
        FALSE_TOKEN => Some(false),
        _ => None,
    }
}

/// Section name → (key → raw value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct ConfigSnapshot {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl From<Value> for ConfigSnapshot {
    /// Sections that are not JSON objects (such as an `{"error": "..."}`
    /// marker) are dropped.
    fn from(value: Value) -> Self {
        let Value::Object(root) = value else {
            return Self::default();
        };

        let sections = root
            .into_iter()
            .filter_map(|(name, section)| match section {
                Value::Object(entries) => Some((
                    name,
                    entries
                        .into_iter()
                        .map(|(key, raw)| (key, wire_to_text(raw)))
                        .collect(),
                )),
                _ => None,
            })
            .collect();

        Self { sections }
    }
}

impl Serialize for ConfigSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sections.serialize(serializer)
    }
}

fn wire_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Bool(b) => encode_bool(b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.sections.iter().map(|(name, entries)| (name.as_str(), entries))
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub(crate) fn values_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &str, &mut String)> {
        self.sections.iter_mut().flat_map(|(section, entries)| {
            entries
                .iter_mut()
                .map(move |(key, value)| (section.as_str(), key.as_str(), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_tokens() {
        assert_eq!(encode_bool(true), "True");
        assert_eq!(encode_bool(false), "False");
        assert_eq!(decode_bool("True"), Some(true));
        assert_eq!(decode_bool("False"), Some(false));
        assert_eq!(decode_bool("true"), None);
        assert_eq!(decode_bool("yes"), None);
    }

    #[test]
    fn deserialize_normalizes_native_values() {
        let json = r#"{
            "Bot": {
                "context_history_enabled": true,
                "context_history_retention_minutes": 60,
                "status_message": null,
                "client_name": "AI bot"
            }
        }"#;
        let snap: ConfigSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.get("Bot", "context_history_enabled"), Some("True"));
        assert_eq!(snap.get("Bot", "context_history_retention_minutes"), Some("60"));
        assert_eq!(snap.get("Bot", "status_message"), Some(""));
        assert_eq!(snap.get("Bot", "client_name"), Some("AI bot"));
    }

    #[test]
    fn deserialize_drops_non_object_sections() {
        let snap: ConfigSnapshot =
            serde_json::from_str(r#"{"error": "Config not serializable", "Bot": {}}"#).unwrap();
        assert!(snap.section("error").is_none());
        assert!(snap.section("Bot").is_some());
    }

    #[test]
    fn non_object_root_is_empty() {
        let snap: ConfigSnapshot = serde_json::from_str("[1, 2]").unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn serializes_as_nested_string_map() {
        let mut snap = ConfigSnapshot::new();
        snap.insert("Connection", "port", "10333");
        snap.insert("Bot", "bot_locked", "False");

        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Bot": {"bot_locked": "False"},
                "Connection": {"port": "10333"}
            })
        );
    }
}
