pub mod commands;
pub mod config;
pub mod conversation;
pub mod directives;
pub mod discord_text;
pub mod error;
pub mod flags;
pub mod formatter;
pub mod llm;
pub mod prompt;
pub mod reply;
pub mod settings;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub llm_client: Arc<dyn llm::ModelClient>,
    pub settings: Arc<dyn settings::SettingsStore>,
    /// Bot's own user ID for context formatting
    pub bot_id: u64,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
