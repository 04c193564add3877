//! Settings commands typed inside ordinary chat messages:
//!
//! ```text
//! --setFlag="name: value"   --getFlag="name"   --listFlags
//! --removeFlag="name"       --setPersonality <text>
//! ```
//!
//! Keywords match case-insensitively. The first command found wins and at
//! most one command runs per message.

use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use crate::error::SettingsError;
use crate::flags::{self, display_value, kind_of_value, Flag, FlagKind, PERSONALITY_KEY};
use crate::settings::SettingsStore;

macro_rules! command_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

static SET_FLAG: LazyLock<Regex> = command_regex!(r#"(?i)--setflag="([^"]*)""#);
static GET_FLAG: LazyLock<Regex> = command_regex!(r#"(?i)--getflag="([^"]*)""#);
static LIST_FLAGS: LazyLock<Regex> = command_regex!(r"(?i)--listflags\b");
static REMOVE_FLAG: LazyLock<Regex> = command_regex!(r#"(?i)--removeflag="([^"]*)""#);
static SET_PERSONALITY: LazyLock<Regex> = command_regex!(r"(?is)--setpersonality\b(.*)$");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// No command matched; the message should be answered normally.
    Unhandled,
    /// A command ran; the text is the reply to send back.
    Handled(String),
}

/// A key the get/remove commands may address: a registered flag or the
/// personality text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKey {
    Flag(Flag),
    Personality,
}

impl SettingKey {
    fn resolve(name: &str) -> Result<Self, SettingsError> {
        if let Some(flag) = Flag::from_name(name) {
            return Ok(SettingKey::Flag(flag));
        }
        if name.trim().eq_ignore_ascii_case(PERSONALITY_KEY) {
            return Ok(SettingKey::Personality);
        }
        Err(SettingsError::UnknownFlag(name.trim().to_string()))
    }

    fn name(self) -> &'static str {
        match self {
            SettingKey::Flag(flag) => flag.name(),
            SettingKey::Personality => PERSONALITY_KEY,
        }
    }

    fn kind(self) -> FlagKind {
        match self {
            SettingKey::Flag(flag) => flag.kind(),
            SettingKey::Personality => FlagKind::String,
        }
    }
}

/// Runs the settings command contained in `text`, if any.
///
/// Commands only exist inside a community; without one every message is
/// [`CommandOutcome::Unhandled`].
pub fn run_command(
    store: &dyn SettingsStore,
    community_id: Option<&str>,
    text: &str,
) -> CommandOutcome {
    let Some(community_id) = community_id else {
        return CommandOutcome::Unhandled;
    };

    let reply = if let Some(caps) = SET_FLAG.captures(text) {
        set_flag(store, community_id, &caps[1])
    } else if let Some(caps) = GET_FLAG.captures(text) {
        get_flag(store, community_id, &caps[1])
    } else if LIST_FLAGS.is_match(text) {
        list_flags(store, community_id)
    } else if let Some(caps) = REMOVE_FLAG.captures(text) {
        remove_flag(store, community_id, &caps[1])
    } else if let Some(caps) = SET_PERSONALITY.captures(text) {
        set_personality(store, community_id, &caps[1])
    } else {
        return CommandOutcome::Unhandled;
    };

    CommandOutcome::Handled(reply)
}

fn set_flag(store: &dyn SettingsStore, community_id: &str, argument: &str) -> String {
    let Some((name, raw)) = argument.split_once(':') else {
        return "❌ Usage: `--setFlag=\"name: value\"`".to_string();
    };

    match flags::coerce(name, raw) {
        Ok((flag, value)) => {
            let shown = display_value(&value);
            store.set(community_id, flag.name(), value);
            info!(
                "Community {}: set flag {} = {}",
                community_id,
                flag.name(),
                shown
            );
            format!(
                "✅ Set `{}` ({}) to `{}`.",
                flag.name(),
                flag.kind(),
                shown
            )
        }
        Err(e) => format!("❌ Could not set flag: {}.", e),
    }
}

fn get_flag(store: &dyn SettingsStore, community_id: &str, name: &str) -> String {
    let key = match SettingKey::resolve(name) {
        Ok(key) => key,
        Err(e) => return format!("❌ {}.", e),
    };

    match store.get(community_id, key.name()) {
        Some(value) => format!(
            "`{}` ({}) = `{}`",
            key.name(),
            key.kind(),
            display_value(&value)
        ),
        None => format!("`{}` ({}) is not set.", key.name(), key.kind()),
    }
}

fn list_flags(store: &dyn SettingsStore, community_id: &str) -> String {
    let settings = store.list(community_id);
    if settings.is_empty() {
        return "📭 No flags are set for this server.".to_string();
    }

    let mut lines = vec!["Flags for this server:".to_string()];
    for (name, value) in &settings {
        let kind = flags::type_of(name).or_else(|| kind_of_value(value));
        let annotation = kind.map(|k| format!(" ({})", k)).unwrap_or_default();
        lines.push(format!("- `{}`{}: `{}`", name, annotation, display_value(value)));
    }
    lines.join("\n")
}

fn remove_flag(store: &dyn SettingsStore, community_id: &str, name: &str) -> String {
    let key = match SettingKey::resolve(name) {
        Ok(key) => key,
        Err(e) => return format!("❌ {}.", e),
    };

    if store.remove(community_id, key.name()) {
        info!("Community {}: removed {}", community_id, key.name());
        format!("🗑️ Removed `{}`.", key.name())
    } else {
        format!("`{}` was not set.", key.name())
    }
}

fn set_personality(store: &dyn SettingsStore, community_id: &str, remainder: &str) -> String {
    let personality = remainder.trim();
    if personality.is_empty() {
        let e = SettingsError::EmptyInput("personality");
        return format!("❌ Could not set personality: {}.", e);
    }

    store.set(
        community_id,
        PERSONALITY_KEY,
        serde_json::Value::String(personality.to_string()),
    );
    info!("Community {}: personality updated", community_id);
    "✅ Personality updated.".to_string()
}
