//! Registered per-community flags and the coercion of raw command text into
//! typed setting values.
//!
//! The registry is closed: every flag the bot understands is a variant of
//! [`Flag`], so adding one forces every match over it to be revisited.

use serde_json::{Number, Value};
use std::fmt;

use crate::error::{SettingsError, SettingsResult};

/// Setting key under which the community personality text is stored.
///
/// Personality is always a string and is set through its own command, so it
/// lives outside the typed registry.
pub const PERSONALITY_KEY: &str = "personality";

const TRUE_WORDS: [&str; 4] = ["true", "1", "yes", "on"];
const FALSE_WORDS: [&str; 4] = ["false", "0", "no", "off"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Boolean,
    Number,
    String,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlagKind::Boolean => "boolean",
            FlagKind::Number => "number",
            FlagKind::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Enables the RuneScape mode augmentation block in prompts.
    Runescape,
    /// Community-wide override for how many history messages are included.
    Context,
}

impl Flag {
    pub const ALL: [Flag; 2] = [Flag::Runescape, Flag::Context];

    pub fn name(self) -> &'static str {
        match self {
            Flag::Runescape => "runescape",
            Flag::Context => "context",
        }
    }

    pub fn kind(self) -> FlagKind {
        match self {
            Flag::Runescape => FlagKind::Boolean,
            Flag::Context => FlagKind::Number,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Flag::Runescape => "Answer with a RuneScape flavour",
            Flag::Context => "Number of recent messages to include as context",
        }
    }

    /// Looks a flag up by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Flag> {
        let name = name.trim();
        Flag::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(name))
    }

    /// Converts raw command text into the JSON value stored for this flag.
    pub fn coerce(self, raw: &str) -> SettingsResult<Value> {
        let invalid = || SettingsError::InvalidValue {
            flag: self.name().to_string(),
            kind: self.kind(),
            value: raw.trim().to_string(),
        };

        match self.kind() {
            FlagKind::Boolean => {
                let word = raw.trim().to_ascii_lowercase();
                if TRUE_WORDS.contains(&word.as_str()) {
                    Ok(Value::Bool(true))
                } else if FALSE_WORDS.contains(&word.as_str()) {
                    Ok(Value::Bool(false))
                } else {
                    Err(invalid())
                }
            }
            FlagKind::Number => {
                let parsed: f64 = raw.trim().parse().map_err(|_| invalid())?;
                // `Number::from_f64` rejects NaN and the infinities.
                Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(invalid)
            }
            FlagKind::String => Ok(Value::String(raw.trim().to_string())),
        }
    }
}

/// Type of a registered flag, or `None` for names the registry does not know.
pub fn type_of(name: &str) -> Option<FlagKind> {
    Flag::from_name(name).map(Flag::kind)
}

/// Validates `raw` against the flag registered under `name`.
pub fn coerce(name: &str, raw: &str) -> SettingsResult<(Flag, Value)> {
    let flag =
        Flag::from_name(name).ok_or_else(|| SettingsError::UnknownFlag(name.trim().to_string()))?;
    let value = flag.coerce(raw)?;
    Ok((flag, value))
}

/// Renders a stored value the way replies show it: whole numbers without a
/// trailing `.0`, strings unquoted.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Kind of a stored JSON value, used to annotate settings the registry does
/// not describe.
pub fn kind_of_value(value: &Value) -> Option<FlagKind> {
    match value {
        Value::Bool(_) => Some(FlagKind::Boolean),
        Value::Number(_) => Some(FlagKind::Number),
        Value::String(_) => Some(FlagKind::String),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_accepts_exactly_the_listed_words() {
        for word in ["true", "TRUE", "1", "yes", "Yes", "on", "ON"] {
            assert_eq!(Flag::Runescape.coerce(word).unwrap(), Value::Bool(true), "{word}");
        }
        for word in ["false", "False", "0", "no", "NO", "off", "Off"] {
            assert_eq!(Flag::Runescape.coerce(word).unwrap(), Value::Bool(false), "{word}");
        }
        for word in ["", "y", "n", "2", "enabled", "truee", "t"] {
            let err = Flag::Runescape.coerce(word).unwrap_err();
            assert!(matches!(err, SettingsError::InvalidValue { .. }), "{word}");
        }
    }

    #[test]
    fn boolean_tolerates_surrounding_whitespace() {
        assert_eq!(Flag::Runescape.coerce("  on ").unwrap(), Value::Bool(true));
    }

    #[test]
    fn number_parses_floats_and_rejects_nan() {
        assert_eq!(Flag::Context.coerce("42").unwrap(), serde_json::json!(42.0));
        assert_eq!(Flag::Context.coerce(" 2.5 ").unwrap(), serde_json::json!(2.5));
        for bad in ["abc", "NaN", "nan", "", "inf"] {
            assert!(
                matches!(
                    Flag::Context.coerce(bad),
                    Err(SettingsError::InvalidValue { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = coerce("volume", "3").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownFlag(name) if name == "volume"));
        assert_eq!(type_of("volume"), None);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(Flag::from_name(" RuneScape "), Some(Flag::Runescape));
        assert_eq!(type_of("CONTEXT"), Some(FlagKind::Number));
        assert_eq!(Flag::from_name(PERSONALITY_KEY), None);
    }

    #[test]
    fn display_value_drops_integral_fraction() {
        assert_eq!(display_value(&serde_json::json!(42.0)), "42");
        assert_eq!(display_value(&serde_json::json!(2.5)), "2.5");
        assert_eq!(display_value(&serde_json::json!("formal")), "formal");
        assert_eq!(display_value(&Value::Bool(true)), "true");
    }
}
