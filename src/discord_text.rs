use poise::serenity_prelude as serenity;

use std::collections::HashMap;

use crate::formatter::{mention_tokens, ChatMessage, MentionKind, MentionNames};

pub fn strip_bot_mentions(input: &str, bot_id: u64) -> String {
    let mention = format!("<@{}>", bot_id);
    let mention_nick = format!("<@!{}>", bot_id);

    input
        .replace(&mention, "")
        .replace(&mention_nick, "")
        .trim()
        .to_string()
}

/// Message content plus any embed text, so bot posts made of embeds still
/// show up in the conversation.
pub fn extract_message_text(message: &serenity::Message) -> String {
    let mut parts = Vec::new();

    let content = message.content.trim();
    if !content.is_empty() {
        parts.push(content.to_string());
    }

    for embed in &message.embeds {
        if let Some(title) = &embed.title {
            let title = title.trim();
            if !title.is_empty() {
                parts.push(title.to_string());
            }
        }

        if let Some(description) = &embed.description {
            let description = description.trim();
            if !description.is_empty() {
                parts.push(description.to_string());
            }
        }

        for field in &embed.fields {
            let name = field.name.trim();
            let value = field.value.trim();

            if name.is_empty() && value.is_empty() {
                continue;
            }

            if name.is_empty() {
                parts.push(value.to_string());
                continue;
            }

            if value.is_empty() {
                parts.push(name.to_string());
                continue;
            }

            parts.push(format!("{}: {}", name, value));
        }
    }

    parts.join("\n")
}

/// Guild names needed to render one reply's messages, taken from the cache
/// once and keyed on the triggering message's guild. History fetched over
/// HTTP carries neither `guild_id` nor `member`, so it cannot resolve these
/// itself.
#[derive(Debug, Clone, Default)]
pub struct GuildDirectory {
    pub nicknames: HashMap<u64, String>,
    pub roles: HashMap<u64, String>,
    pub channels: HashMap<u64, String>,
}

impl GuildDirectory {
    /// Looks up the authors, mentioned users, roles and channels of
    /// `messages` in the cached guild. Without a guild (DMs) or a cache entry
    /// the directory is empty and names fall back to the user objects.
    pub fn from_cache<'m>(
        cache: &serenity::Cache,
        guild_id: Option<serenity::GuildId>,
        messages: impl IntoIterator<Item = &'m serenity::Message>,
    ) -> Self {
        let mut directory = Self::default();
        let messages: Vec<&serenity::Message> = messages.into_iter().collect();
        for message in &messages {
            directory.remember_member(message);
        }

        let Some(guild) = guild_id.and_then(|id| cache.guild(id)) else {
            return directory;
        };

        for message in &messages {
            let users = std::iter::once(&message.author).chain(&message.mentions);
            for user in users {
                if directory.nicknames.contains_key(&user.id.get()) {
                    continue;
                }
                if let Some(nick) = guild.members.get(&user.id).and_then(|m| m.nick.clone()) {
                    directory.nicknames.insert(user.id.get(), nick);
                }
            }

            for (kind, id) in mentioned_ids(message) {
                match kind {
                    MentionKind::Role => {
                        if let Some(role) = guild.roles.get(&serenity::RoleId::new(id)) {
                            directory.roles.insert(id, role.name.clone());
                        }
                    }
                    MentionKind::Channel => {
                        if let Some(channel) = guild.channels.get(&serenity::ChannelId::new(id)) {
                            directory.channels.insert(id, channel.name.clone());
                        }
                    }
                    MentionKind::User => {}
                }
            }
        }

        directory
    }

    /// Keeps the nickname a gateway message carries on its partial member.
    pub fn remember_member(&mut self, message: &serenity::Message) {
        if let Some(nick) = message.member.as_ref().and_then(|m| m.nick.clone()) {
            self.nicknames.entry(message.author.id.get()).or_insert(nick);
        }
    }

    /// Guild nickname, then global display name, then username.
    pub fn display_name(&self, user: &serenity::User) -> String {
        self.nicknames
            .get(&user.id.get())
            .cloned()
            .or_else(|| user.global_name.clone())
            .unwrap_or_else(|| user.name.clone())
    }
}

/// Role ids from `mention_roles` plus every mention token in the content.
/// Ids of zero are skipped since serenity's id types reject them.
fn mentioned_ids(message: &serenity::Message) -> Vec<(MentionKind, u64)> {
    message
        .mention_roles
        .iter()
        .map(|id| (MentionKind::Role, id.get()))
        .chain(mention_tokens(&message.content))
        .filter(|(_, id)| *id != 0)
        .collect()
}

pub fn to_chat_message(message: &serenity::Message, directory: &GuildDirectory) -> ChatMessage {
    ChatMessage {
        author_id: message.author.id.get(),
        author_name: directory.display_name(&message.author),
        author_is_bot: message.author.bot,
        content: extract_message_text(message),
    }
}

/// Names for everything `message` mentions. Users come with the message;
/// roles and channels come from `directory`.
pub fn mention_names(message: &serenity::Message, directory: &GuildDirectory) -> MentionNames {
    let mut names = MentionNames::default();

    for user in &message.mentions {
        names.users.insert(user.id.get(), directory.display_name(user));
    }

    for (kind, id) in mentioned_ids(message) {
        let (known, found) = match kind {
            MentionKind::Role => (&directory.roles, &mut names.roles),
            MentionKind::Channel => (&directory.channels, &mut names.channels),
            MentionKind::User => continue,
        };
        if let Some(name) = known.get(&id) {
            found.insert(id, name.clone());
        }
    }

    names
}

/// Splits `content` into pieces of at most `limit` characters, preferring to
/// break after a newline, then after a space.
pub fn split_message(content: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = content.trim();

    while !rest.is_empty() {
        if rest.chars().count() <= limit {
            chunks.push(rest.to_string());
            break;
        }

        let hard_end = rest
            .char_indices()
            .nth(limit)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..hard_end];
        let end = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|idx| *idx > 0)
            .map(|idx| idx + 1)
            .unwrap_or(hard_end);

        let chunk = rest[..end].trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = rest[end..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_mention_forms() {
        assert_eq!(strip_bot_mentions("<@42> hi <@!42>", 42), "hi");
        assert_eq!(strip_bot_mentions("<@7> hi", 42), "<@7> hi");
    }

    #[test]
    fn short_messages_are_not_split() {
        assert_eq!(split_message("  hello  ", 2000), vec!["hello".to_string()]);
        assert!(split_message("   ", 2000).is_empty());
    }

    #[test]
    fn splits_on_newlines_then_spaces() {
        let chunks = split_message("aaaa\nbbbb cccc", 10);
        assert_eq!(chunks, vec!["aaaa", "bbbb cccc"]);

        let chunks = split_message("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three", "four"]);
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let text = "é".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chat_message_falls_back_to_username_and_embeds() {
        let mut msg = serenity::Message::default();
        msg.author = serenity::User::default();
        msg.author.id = serenity::UserId::new(5);
        msg.author.name = "dyno".to_string();
        msg.author.bot = true;
        msg.content = "  ".to_string();
        let mut embed = serenity::Embed::default();
        embed.title = Some("Server rules".to_string());
        msg.embeds.push(embed);

        let chat = to_chat_message(&msg, &GuildDirectory::default());
        assert_eq!(chat.author_id, 5);
        assert_eq!(chat.author_name, "dyno");
        assert!(chat.author_is_bot);
        assert_eq!(chat.content, "Server rules");
    }

    fn authored_by(id: u64, name: &str) -> serenity::Message {
        let mut msg = serenity::Message::default();
        msg.author = serenity::User::default();
        msg.author.id = serenity::UserId::new(id);
        msg.author.name = name.to_string();
        msg
    }

    #[test]
    fn nickname_is_shared_between_gateway_and_history_messages() {
        // Gateway events carry the partial member; history fetched over HTTP
        // has neither `member` nor `guild_id`.
        let mut current = authored_by(1, "alice");
        current.guild_id = Some(serenity::GuildId::new(10));
        let mut member = serenity::Member::default();
        member.nick = Some("Ali".to_string());
        current.member = Some(Box::new(member.into()));
        let history = authored_by(1, "alice");

        let mut directory = GuildDirectory::default();
        directory.remember_member(&current);

        assert_eq!(to_chat_message(&current, &directory).author_name, "Ali");
        assert_eq!(to_chat_message(&history, &directory).author_name, "Ali");
    }

    #[test]
    fn global_name_beats_username_without_a_nickname() {
        let mut msg = authored_by(2, "bob_1999");
        msg.author.global_name = Some("Bob".to_string());
        let directory = GuildDirectory::default();
        assert_eq!(to_chat_message(&msg, &directory).author_name, "Bob");
    }

    #[test]
    fn history_mentions_resolve_without_a_guild_id() {
        let mut msg = authored_by(1, "alice");
        msg.content = "ask <@&7> or <@&8> in <#42>, not <#43>".to_string();
        msg.mention_roles = vec![serenity::RoleId::new(7)];
        let mut mentioned = serenity::User::default();
        mentioned.id = serenity::UserId::new(3);
        mentioned.name = "carol".to_string();
        msg.mentions.push(mentioned);

        let mut directory = GuildDirectory::default();
        directory.roles.insert(7, "mods".to_string());
        directory.roles.insert(8, "helpers".to_string());
        directory.channels.insert(42, "general".to_string());
        directory.nicknames.insert(3, "Caz".to_string());

        let names = mention_names(&msg, &directory);
        assert_eq!(names.roles.get(&7).map(String::as_str), Some("mods"));
        assert_eq!(names.roles.get(&8).map(String::as_str), Some("helpers"));
        assert_eq!(names.channels.get(&42).map(String::as_str), Some("general"));
        assert!(!names.channels.contains_key(&43));
        assert_eq!(names.users.get(&3).map(String::as_str), Some("Caz"));
    }
}
