use crate::directives::{DEFAULT_CONTEXT_SIZE, MAX_CONTEXT_SIZE};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub bot_name: String,
    pub status_message: String,
    pub llama_url: String,
    pub llama_model: String,
    /// Model used when a message carries the `--advanced` directive.
    pub llama_advanced_model: String,
    pub llama_api_key: Option<String>,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: Option<u32>,
    pub settings_path: String,
    // Context window
    pub default_context_size: usize,
    pub max_context_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let llama_model = env::var("LLAMA_MODEL").unwrap_or_else(|_| "local-model".to_string());

        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            bot_name: env::var("BOT_NAME").unwrap_or_else(|_| "Parley".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Mention me to chat!".to_string()),
            llama_url: env::var("LLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".to_string()),
            llama_advanced_model: env::var("LLAMA_ADVANCED_MODEL")
                .unwrap_or_else(|_| llama_model.clone()),
            llama_model,
            llama_api_key: env::var("LLAMA_API_KEY").ok(),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            llm_max_tokens: env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()),
            settings_path: env::var("SETTINGS_PATH")
                .unwrap_or_else(|_| "data/settings.json".to_string()),
            default_context_size: env::var("DEFAULT_CONTEXT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_CONTEXT_SIZE),
            max_context_size: env::var("MAX_CONTEXT_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(|n| n.min(MAX_CONTEXT_SIZE))
                .unwrap_or(MAX_CONTEXT_SIZE),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("bot_name", &self.bot_name)
            .field("status_message", &self.status_message)
            .field("llama_url", &self.llama_url)
            .field("llama_model", &self.llama_model)
            .field("llama_advanced_model", &self.llama_advanced_model)
            .field(
                "llama_api_key",
                &self.llama_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("settings_path", &self.settings_path)
            .field("default_context_size", &self.default_context_size)
            .field("max_context_size", &self.max_context_size)
            .finish()
    }
}

/// Discord message limit is 2000 characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
