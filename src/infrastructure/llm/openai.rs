use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::{ConfigError, LlmConfig};
use crate::infrastructure::embedding::OPENAI_API_KEY;

pub struct OpenAiLlm {
    client: openai::Client,
    model: String,
    temperature: f64,
    max_tokens: u64,
}

impl OpenAiLlm {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        if std::env::var(OPENAI_API_KEY).is_err() {
            return Err(ConfigError::MissingEnv(OPENAI_API_KEY.to_string()));
        }

        Ok(Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::generation(e.to_string()))
    }
}
