mod anthropic;
mod openai;

use std::sync::Arc;

use crate::domain::ports::LlmService;
use crate::infrastructure::config::{ConfigError, LlmConfig, LlmProvider};

pub use anthropic::{AnthropicLlm, ANTHROPIC_API_KEY};
pub use openai::OpenAiLlm;

/// Builds the answer generator selected by `llm.provider`.
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmService>, ConfigError> {
    let llm: Arc<dyn LlmService> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiLlm::from_config(config)?),
        LlmProvider::Anthropic => Arc::new(AnthropicLlm::from_config(config)?),
    };
    tracing::info!(provider = ?config.provider, model = %config.model, "answer generator ready");
    Ok(llm)
}
