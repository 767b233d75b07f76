/// Editable field type inference for untyped configuration values.
///
/// The service publishes no schema, so the widget for each value is guessed
/// from the key name and the value's text. Inference is a pure function of
/// `(key, value)`; checks run in a fixed order and the first match wins.
use serde::Serialize;

use super::snapshot::decode_bool;

/// Keys rendered as multi-line text areas.
pub const DEFAULT_MULTILINE_KEYS: &[&str] = &["ai_system_instructions", "welcome_message_instructions"];

/// Key fragments that mark a value as secret.
const SECRET_MARKERS: &[&str] = &["password", "api_key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Password,
    Boolean,
    Number,
    MultilineText,
    Text,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password => write!(f, "password"),
            Self::Boolean => write!(f, "boolean"),
            Self::Number => write!(f, "number"),
            Self::MultilineText => write!(f, "multiline-text"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Infer with the built-in multi-line allowlist.
pub fn infer_kind(key: &str, value: &str) -> FieldKind {
    infer_kind_with(key, value, DEFAULT_MULTILINE_KEYS)
}

/// Infer a field kind:
///
/// 1. key contains `password` or `api_key` → password
/// 2. value is `True` / `False` → boolean
/// 3. value is numeric → number
/// 4. key is in `multiline_keys` → multi-line text
/// 5. otherwise → text
pub fn infer_kind_with<S: AsRef<str>>(key: &str, value: &str, multiline_keys: &[S]) -> FieldKind {
    if SECRET_MARKERS.iter().any(|marker| key.contains(marker)) {
        FieldKind::Password
    } else if decode_bool(value).is_some() {
        FieldKind::Boolean
    } else if is_numeric(value) {
        FieldKind::Number
    } else if multiline_keys.iter().any(|k| k.as_ref() == key) {
        FieldKind::MultilineText
    } else {
        FieldKind::Text
    }
}

/// A finite decimal number, surrounding whitespace allowed.
pub fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_keys_win_over_value_shape() {
        assert_eq!(infer_kind("password", "hunter2"), FieldKind::Password);
        assert_eq!(infer_kind("channel_password", ""), FieldKind::Password);
        assert_eq!(infer_kind("gemini_api_key", "True"), FieldKind::Password);
        assert_eq!(infer_kind("weather_api_key", "12345"), FieldKind::Password);
    }

    #[test]
    fn boolean_tokens() {
        assert_eq!(infer_kind("bot_locked", "True"), FieldKind::Boolean);
        assert_eq!(infer_kind("bot_locked", "False"), FieldKind::Boolean);
        assert_eq!(infer_kind("bot_locked", "true"), FieldKind::Text);
    }

    #[test]
    fn numbers() {
        assert_eq!(infer_kind("port", "10333"), FieldKind::Number);
        assert_eq!(infer_kind("ratio", "0.25"), FieldKind::Number);
        assert_eq!(infer_kind("offset", "-3"), FieldKind::Number);
        assert_eq!(infer_kind("delay", " 5 "), FieldKind::Number);
        assert_eq!(infer_kind("port", ""), FieldKind::Text);
        assert_eq!(infer_kind("port", "NaN"), FieldKind::Text);
        assert_eq!(infer_kind("port", "inf"), FieldKind::Text);
        assert_eq!(infer_kind("host", "10.0.0.1"), FieldKind::Text);
    }

    #[test]
    fn multiline_allowlist() {
        assert_eq!(
            infer_kind("ai_system_instructions", "Be brief."),
            FieldKind::MultilineText
        );
        assert_eq!(infer_kind("status_message", "Be brief."), FieldKind::Text);
        assert_eq!(
            infer_kind_with("motd", "hello", &["motd"]),
            FieldKind::MultilineText
        );
    }

    #[test]
    fn numeric_value_beats_multiline_key() {
        assert_eq!(infer_kind("ai_system_instructions", "42"), FieldKind::Number);
    }

    #[test]
    fn non_decimal_numerals_stay_text() {
        for value in ["Infinity", "-inf", "NaN", "0x10"] {
            assert_eq!(infer_kind("limit", value), FieldKind::Text, "{value}");
        }
        assert_eq!(infer_kind("limit", "1e3"), FieldKind::Number);
        assert_eq!(infer_kind("limit", " 42 "), FieldKind::Number);
    }

    #[test]
    fn inference_is_deterministic() {
        let cases = [
            ("password", "x"),
            ("bot_locked", "True"),
            ("port", "10333"),
            ("ai_system_instructions", "hi"),
            ("nickname", "PyBot+"),
        ];
        let first: Vec<FieldKind> = cases.iter().map(|(k, v)| infer_kind(k, v)).collect();
        for _ in 0..3 {
            let again: Vec<FieldKind> = cases.iter().rev().map(|(k, v)| infer_kind(k, v)).collect();
            let again: Vec<FieldKind> = again.into_iter().rev().collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn kind_display() {
        assert_eq!(FieldKind::MultilineText.to_string(), "multiline-text");
        assert_eq!(FieldKind::Password.to_string(), "password");
    }
}
