use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Which configured model a request should go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Advanced,
}

/// Turns an assembled prompt into the model's reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> anyhow::Result<String>;
}

pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    advanced_model: String,
    max_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut openai_config = OpenAIConfig::new().with_api_base(&config.llama_url);

        if let Some(key) = &config.llama_api_key {
            openai_config = openai_config.with_api_key(key);
        } else {
            openai_config = openai_config.with_api_key("unused");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.llama_model.clone(),
            advanced_model: config.llama_advanced_model.clone(),
            max_tokens: config.llm_max_tokens,
        })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.model,
            ModelTier::Advanced => &self.advanced_model,
        }
    }
}

#[async_trait]
impl ModelClient for LlmClient {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> anyhow::Result<String> {
        let model = self.model_for(tier);
        debug!("LLM: sending {} char prompt to {}", prompt.len(), model);

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()];

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(model).messages(messages);
        if let Some(max_tokens) = self.max_tokens {
            request.max_completion_tokens(max_tokens);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_else(|| "No response from LLM".to_string());

        Ok(content)
    }
}
