use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::{ConfigError, EmbeddingConfig};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// OpenAI embeddings. The same instance must serve both ingestion and
/// querying so that vectors share one space.
pub struct TextEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, ConfigError> {
        if std::env::var(OPENAI_API_KEY).is_err() {
            return Err(ConfigError::MissingEnv(OPENAI_API_KEY.to_string()));
        }

        Ok(Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    fn check_dimension(&self, embedding: Embedding) -> Result<Embedding, DomainError> {
        if embedding.dimension() != self.dimension {
            return Err(DomainError::embedding(format!(
                "model {} returned {} dimensions, expected {}",
                self.model,
                embedding.dimension(),
                self.dimension
            )));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let model = self.client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text)
            .map_err(|e| DomainError::embedding(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        let embedding = embeddings
            .into_iter()
            .next()
            .map(|(_doc, emb)| Embedding::from(emb.first().vec))
            .ok_or_else(|| DomainError::embedding("No embedding returned"))?;

        self.check_dimension(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
