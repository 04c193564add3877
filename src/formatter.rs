//! Renders chat messages into attributable dialogue lines for the prompt.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Label used for the assistant's own messages and mentions of it.
pub const SELF_MARKER: &str = "You";

/// `<@id>`, `<@!id>` (users), `<@&id>` (roles), `<#id>` (channels).
static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(@!?|@&|#)(\d+)>").unwrap_or_else(|_| unreachable!())
});

/// A platform-neutral view of one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    User,
    Role,
    Channel,
}

/// Every well-formed mention token in `content`, in order of appearance.
pub fn mention_tokens(content: &str) -> impl Iterator<Item = (MentionKind, u64)> + '_ {
    MENTION_PATTERN.captures_iter(content).filter_map(|caps| {
        let id = caps[2].parse::<u64>().ok()?;
        let kind = match &caps[1] {
            "@&" => MentionKind::Role,
            "#" => MentionKind::Channel,
            _ => MentionKind::User,
        };
        Some((kind, id))
    })
}

/// Appends a qualifier to names that read the same as [`SELF_MARKER`], so
/// nobody else's lines or mentions pass for the assistant's own.
fn member_name(name: &str) -> String {
    if name.trim().eq_ignore_ascii_case(SELF_MARKER) {
        format!("{} (member)", name.trim())
    } else {
        name.to_string()
    }
}

/// Display names for the ids a message mentions.
#[derive(Debug, Clone, Default)]
pub struct MentionNames {
    pub users: HashMap<u64, String>,
    pub roles: HashMap<u64, String>,
    pub channels: HashMap<u64, String>,
}

impl MentionNames {
    /// Merges another lookup into this one, keeping existing entries.
    pub fn extend(&mut self, other: MentionNames) {
        for (id, name) in other.users {
            self.users.entry(id).or_insert(name);
        }
        for (id, name) in other.roles {
            self.roles.entry(id).or_insert(name);
        }
        for (id, name) in other.channels {
            self.channels.entry(id).or_insert(name);
        }
    }
}

pub struct ContextFormatter<'a> {
    self_id: u64,
    names: &'a MentionNames,
}

impl<'a> ContextFormatter<'a> {
    pub fn new(self_id: u64, names: &'a MentionNames) -> Self {
        Self { self_id, names }
    }

    pub fn author_label(&self, message: &ChatMessage) -> String {
        if message.author_id == self.self_id {
            SELF_MARKER.to_string()
        } else if message.author_is_bot {
            format!("Bot ({})", message.author_name)
        } else {
            member_name(&message.author_name)
        }
    }

    /// Replaces mention tokens with readable `@name` / `#name` text.
    pub fn resolve_mentions(&self, content: &str) -> String {
        MENTION_PATTERN
            .replace_all(content, |caps: &regex::Captures<'_>| {
                let Ok(id) = caps[2].parse::<u64>() else {
                    return caps[0].to_string();
                };
                match &caps[1] {
                    "@&" => match self.names.roles.get(&id) {
                        Some(name) => format!("@{}", name),
                        None => "@unknown-role".to_string(),
                    },
                    "#" => match self.names.channels.get(&id) {
                        Some(name) => format!("#{}", name),
                        None => "#unknown-channel".to_string(),
                    },
                    _ if id == self.self_id => format!("@{}", SELF_MARKER),
                    _ => match self.names.users.get(&id) {
                        Some(name) => format!("@{}", member_name(name)),
                        None => "@unknown-user".to_string(),
                    },
                }
            })
            .trim()
            .to_string()
    }

    /// `"<author>: <body>"`
    pub fn format_message(&self, message: &ChatMessage) -> String {
        format!(
            "{}: {}",
            self.author_label(message),
            self.resolve_mentions(&message.content)
        )
    }
}

/// Makes community-supplied text safe to embed inside a quoted prompt
/// section: escapes backslashes and quotes, collapses whitespace runs
/// (newlines included) into single spaces.
pub fn sanitize_personality(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    escaped.split_whitespace().collect::<Vec<_>>().join(" ")
}
