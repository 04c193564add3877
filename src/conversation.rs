//! Turns one triggering message into either a command reply or a prompt for
//! the model.
//!
//! Ordering of the stages is fixed here:
//! 1. the assistant's own mention tokens are stripped,
//! 2. settings commands are matched against that text,
//! 3. only when no command ran are inline directives parsed out of the same
//!    text, and what remains becomes the message the model answers.
//!
//! A message such as `--context 5 --listFlags` therefore runs the command and
//! ignores the directive.

use tracing::debug;

use crate::commands::{run_command, CommandOutcome};
use crate::config::Config;
use crate::directives::{parse_directives_with, Directives};
use crate::discord_text::strip_bot_mentions;
use crate::flags::Flag;
use crate::formatter::{ChatMessage, ContextFormatter, MentionNames};
use crate::llm::{ModelClient, ModelTier};
use crate::prompt::{PromptBuilder, PromptSettings};
use crate::settings::SettingsStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// A settings command ran; its reply goes straight back to the chat.
    CommandReply(String),
    /// Nothing left to answer, e.g. the message was only a mention.
    Ignore,
    Respond(ResponsePlan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePlan {
    /// Message text with mentions of the assistant and directives removed.
    pub text: String,
    pub tier: ModelTier,
    /// How many history messages to fetch, already clamped.
    pub context_size: usize,
}

pub struct Conversation<'a> {
    store: &'a dyn SettingsStore,
    config: &'a Config,
    bot_id: u64,
}

impl<'a> Conversation<'a> {
    pub fn new(store: &'a dyn SettingsStore, config: &'a Config, bot_id: u64) -> Self {
        Self {
            store,
            config,
            bot_id,
        }
    }

    pub fn plan(&self, community_id: Option<&str>, raw_text: &str) -> Plan {
        let text = strip_bot_mentions(raw_text, self.bot_id);

        if let CommandOutcome::Handled(reply) = run_command(self.store, community_id, &text) {
            return Plan::CommandReply(reply);
        }

        let defaults = Directives {
            use_advanced_model: false,
            context_size: self.config.default_context_size,
        };
        let (directives, residual) = parse_directives_with(&text, defaults);
        if residual.is_empty() {
            return Plan::Ignore;
        }

        let tier = if directives.use_advanced_model {
            ModelTier::Advanced
        } else {
            ModelTier::Standard
        };

        Plan::Respond(ResponsePlan {
            text: residual,
            tier,
            context_size: self.context_size(community_id, directives.context_size),
        })
    }

    /// A community-level `context` flag beats the per-message directive.
    /// Either way the result never exceeds the configured ceiling.
    pub fn context_size(&self, community_id: Option<&str>, requested: usize) -> usize {
        let community_size = community_id
            .and_then(|id| self.store.get_number(id, Flag::Context.name()))
            .filter(|n| n.is_finite() && *n >= 1.0)
            .map(|n| n.floor() as usize);

        if let Some(size) = community_size {
            debug!("Using community context size {} over {}", size, requested);
        }

        community_size
            .unwrap_or(requested)
            .clamp(1, self.config.max_context_size)
    }

    /// Builds the prompt from `history` (oldest first) and the triggering
    /// message, whose content should already be the plan's residual text.
    pub fn build_prompt(
        &self,
        community_id: Option<&str>,
        history: &[ChatMessage],
        current: &ChatMessage,
        names: &MentionNames,
    ) -> String {
        let formatter = ContextFormatter::new(self.bot_id, names);
        let lines: Vec<String> = history
            .iter()
            .filter(|msg| !msg.content.trim().is_empty())
            .map(|msg| formatter.format_message(msg))
            .collect();

        let settings = PromptSettings::load(self.store, community_id);
        PromptBuilder::new(&self.config.bot_name, &settings)
            .build(&lines, &formatter.format_message(current))
    }

    pub async fn respond(
        &self,
        model: &dyn ModelClient,
        community_id: Option<&str>,
        plan: &ResponsePlan,
        history: &[ChatMessage],
        current: &ChatMessage,
        names: &MentionNames,
    ) -> anyhow::Result<String> {
        let prompt = self.build_prompt(community_id, history, current, names);
        debug!(
            "Prompt assembled: {} history messages, {} chars, tier {:?}",
            history.len(),
            prompt.len(),
            plan.tier
        );
        model.complete(&prompt, plan.tier).await
    }
}
