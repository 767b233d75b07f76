/// Editable form model for a [`ConfigSnapshot`].
///
/// [`render`] turns a snapshot into grouped, typed fields; the user edits
/// the fields; [`extract`] writes the edited values back into a copy of the
/// original snapshot using the service's textual encodings. Unedited forms
/// round-trip exactly: `extract(&render(s, o), s) == s`.
use anyhow::{Context, Result};
use serde::Serialize;

use super::infer::{DEFAULT_MULTILINE_KEYS, FieldKind, infer_kind_with, is_numeric};
use super::snapshot::{ConfigSnapshot, decode_bool, encode_bool};
use crate::utils::text::humanize_key;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Rendering knobs. Defaults match the bot service's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Sections holding engine-internal settings; never rendered.
    pub hidden_sections: Vec<String>,
    /// The one section that starts expanded.
    pub expanded_section: String,
    /// Keys rendered as multi-line text.
    pub multiline_keys: Vec<String>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            hidden_sections: vec!["WebUI".to_string()],
            expanded_section: "Connection".to_string(),
            multiline_keys: DEFAULT_MULTILINE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Form model
// ---------------------------------------------------------------------------

/// Current value of a field. Booleans are real booleans here; the
/// `True` / `False` tokens only exist in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub section: String,
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: FieldValue,
}

impl FormField {
    /// The field's value in the snapshot encoding.
    pub fn encoded(&self) -> String {
        match &self.value {
            FieldValue::Flag(b) => encode_bool(*b).to_string(),
            FieldValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSection {
    pub name: String,
    pub title: String,
    pub expanded: bool,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormModel {
    pub sections: Vec<FormSection>,
}

impl FormModel {
    pub fn field(&self, section: &str, key: &str) -> Option<&FormField> {
        self.sections
            .iter()
            .find(|s| s.name == section)?
            .fields
            .iter()
            .find(|f| f.key == key)
    }

    fn field_mut(&mut self, section: &str, key: &str) -> Option<&mut FormField> {
        self.sections
            .iter_mut()
            .find(|s| s.name == section)?
            .fields
            .iter_mut()
            .find(|f| f.key == key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Set a field from user input.
    ///
    /// Boolean fields accept the usual spellings (`true`, `off`, `1`, ...).
    /// Number fields reject non-numeric input so the value still infers as
    /// a number after saving. Other kinds take the text as-is.
    pub fn set(&mut self, section: &str, key: &str, input: &str) -> Result<()> {
        let field = self
            .field_mut(section, key)
            .with_context(|| format!("no editable field {section}.{key}"))?;

        field.value = match field.kind {
            FieldKind::Boolean => FieldValue::Flag(
                parse_bool_input(input)
                    .with_context(|| format!("expected a boolean for {section}.{key}, got '{input}'"))?,
            ),
            FieldKind::Number => {
                if !is_numeric(input) {
                    anyhow::bail!("expected a number for {section}.{key}, got '{input}'");
                }
                FieldValue::Text(input.to_string())
            }
            FieldKind::Password | FieldKind::MultilineText | FieldKind::Text => {
                FieldValue::Text(input.to_string())
            }
        };
        Ok(())
    }

    /// Flip a boolean field. Returns the new value.
    pub fn toggle(&mut self, section: &str, key: &str) -> Result<bool> {
        let field = self
            .field_mut(section, key)
            .with_context(|| format!("no editable field {section}.{key}"))?;
        match &mut field.value {
            FieldValue::Flag(b) => {
                *b = !*b;
                Ok(*b)
            }
            FieldValue::Text(_) => anyhow::bail!("{section}.{key} is not a boolean field"),
        }
    }
}

fn parse_bool_input(input: &str) -> Option<bool> {
    if let Some(b) = decode_bool(input) {
        return Some(b);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Render / extract
// ---------------------------------------------------------------------------

/// Build the editable form for a snapshot.
pub fn render(snapshot: &ConfigSnapshot, options: &FormOptions) -> FormModel {
    let sections = snapshot
        .sections()
        .filter(|(name, _)| !options.hidden_sections.iter().any(|h| h == name))
        .map(|(name, entries)| FormSection {
            name: name.to_string(),
            title: humanize_key(name),
            expanded: name == options.expanded_section,
            fields: entries
                .iter()
                .map(|(key, raw)| build_field(name, key, raw, options))
                .collect(),
        })
        .collect();

    FormModel { sections }
}

fn build_field(section: &str, key: &str, raw: &str, options: &FormOptions) -> FormField {
    let kind = infer_kind_with(key, raw, &options.multiline_keys);
    let value = match kind {
        FieldKind::Boolean => FieldValue::Flag(decode_bool(raw).unwrap_or(false)),
        _ => FieldValue::Text(raw.to_string()),
    };
    FormField {
        section: section.to_string(),
        key: key.to_string(),
        label: humanize_key(key),
        kind,
        value,
    }
}

/// Write the form's values into a copy of `original`.
///
/// The result has exactly the sections and keys of `original`. Keys without
/// a form field (hidden sections, keys that appeared after rendering) keep
/// their original value.
pub fn extract(form: &FormModel, original: &ConfigSnapshot) -> ConfigSnapshot {
    let mut updated = original.clone();
    for (section, key, value) in updated.values_mut() {
        if let Some(field) = form.field(section, key) {
            *value = field.encoded();
        }
    }
    updated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::infer::infer_kind;

    fn sample() -> ConfigSnapshot {
        let mut snap = ConfigSnapshot::new();
        snap.insert("Connection", "host", "localhost");
        snap.insert("Connection", "port", "10333");
        snap.insert("Connection", "password", "");
        snap.insert("Bot", "context_history_enabled", "True");
        snap.insert("Bot", "debug_logging_enabled", "False");
        snap.insert("Bot", "reconnect_delay_min", "5");
        snap.insert("Bot", "gemini_api_key", "abc");
        snap.insert("Bot", "ai_system_instructions", "Be helpful.\nBe brief.");
        snap.insert("WebUI", "secret_key", "s3cr3t");
        snap
    }

    #[test]
    fn render_groups_sections_and_skips_hidden() {
        let form = render(&sample(), &FormOptions::default());
        let names: Vec<&str> = form.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Bot", "Connection"]);
    }

    #[test]
    fn only_connection_starts_expanded() {
        let form = render(&sample(), &FormOptions::default());
        for section in &form.sections {
            assert_eq!(section.expanded, section.name == "Connection");
        }
    }

    #[test]
    fn render_titles_and_labels() {
        let mut snap = ConfigSnapshot::new();
        snap.insert("web_hooks", "retry_count", "3");
        let form = render(&snap, &FormOptions::default());
        assert_eq!(form.sections[0].title, "WEB HOOKS");
        assert_eq!(form.sections[0].fields[0].label, "RETRY COUNT");
    }

    #[test]
    fn render_infers_kinds() {
        let form = render(&sample(), &FormOptions::default());
        let kind = |s, k| form.field(s, k).unwrap().kind;
        assert_eq!(kind("Connection", "host"), FieldKind::Text);
        assert_eq!(kind("Connection", "port"), FieldKind::Number);
        assert_eq!(kind("Connection", "password"), FieldKind::Password);
        assert_eq!(kind("Bot", "context_history_enabled"), FieldKind::Boolean);
        assert_eq!(kind("Bot", "gemini_api_key"), FieldKind::Password);
        assert_eq!(kind("Bot", "ai_system_instructions"), FieldKind::MultilineText);
        assert_eq!(
            form.field("Bot", "context_history_enabled").unwrap().value,
            FieldValue::Flag(true)
        );
    }

    #[test]
    fn unedited_form_round_trips() {
        let snap = sample();
        let form = render(&snap, &FormOptions::default());
        assert_eq!(extract(&form, &snap), snap);
    }

    #[test]
    fn empty_snapshot_round_trips() {
        let snap = ConfigSnapshot::new();
        let form = render(&snap, &FormOptions::default());
        assert!(form.sections.is_empty());
        assert_eq!(extract(&form, &snap), snap);
    }

    #[test]
    fn edits_are_encoded_for_the_wire() {
        let snap = sample();
        let mut form = render(&snap, &FormOptions::default());
        form.set("Bot", "debug_logging_enabled", "on").unwrap();
        form.set("Connection", "port", "10444").unwrap();
        form.set("Connection", "host", "tt.example.org").unwrap();
        assert!(!form.toggle("Bot", "context_history_enabled").unwrap());

        let out = extract(&form, &snap);
        assert_eq!(out.get("Bot", "debug_logging_enabled"), Some("True"));
        assert_eq!(out.get("Bot", "context_history_enabled"), Some("False"));
        assert_eq!(out.get("Connection", "port"), Some("10444"));
        assert_eq!(out.get("Connection", "host"), Some("tt.example.org"));
        assert_eq!(out.get("WebUI", "secret_key"), Some("s3cr3t"));
    }

    #[test]
    fn reinferred_kind_survives_edit() {
        let snap = sample();
        let mut form = render(&snap, &FormOptions::default());
        form.set("Bot", "debug_logging_enabled", "yes").unwrap();
        form.set("Bot", "reconnect_delay_min", "7.5").unwrap();

        let out = extract(&form, &snap);
        assert_eq!(
            infer_kind("debug_logging_enabled", out.get("Bot", "debug_logging_enabled").unwrap()),
            FieldKind::Boolean
        );
        assert_eq!(
            infer_kind("reconnect_delay_min", out.get("Bot", "reconnect_delay_min").unwrap()),
            FieldKind::Number
        );
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let mut form = render(&sample(), &FormOptions::default());
        assert!(form.set("Connection", "port", "ten").is_err());
        assert!(form.set("Bot", "debug_logging_enabled", "maybe").is_err());
        assert!(form.set("Nope", "missing", "x").is_err());
        assert!(form.toggle("Connection", "host").is_err());
        assert!(form.set("WebUI", "secret_key", "x").is_err());
    }

    #[test]
    fn keys_missing_from_form_keep_original_value() {
        let snap = sample();
        let form = render(&snap, &FormOptions::default());
        let mut newer = snap.clone();
        newer.insert("Bot", "filtered_words", "spam");
        assert_eq!(extract(&form, &newer).get("Bot", "filtered_words"), Some("spam"));
    }
}
