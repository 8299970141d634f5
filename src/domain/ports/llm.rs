use crate::domain::errors::DomainError;
use async_trait::async_trait;

/// Answer generator. Decoding settings such as temperature belong to the adapter.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError>;
}
