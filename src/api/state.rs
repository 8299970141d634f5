use std::sync::Arc;

use crate::application::{IngestSettings, KnowledgeStore, RagService};
use crate::domain::ports::EmbeddingService;
use crate::infrastructure::{build_llm, build_vector_store, AppConfig, TextEmbedding};

#[derive(Clone)]
pub struct AppState {
    pub knowledge: Arc<KnowledgeStore>,
    pub rag: Arc<RagService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(knowledge: Arc<KnowledgeStore>, rag: Arc<RagService>, config: AppConfig) -> Self {
        Self {
            knowledge,
            rag,
            config: Arc::new(config),
        }
    }

    /// Builds the provider adapters named in `config` and wires them into the services.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let settings = &config.config;

        let embedding = Arc::new(TextEmbedding::from_config(&settings.embedding)?);
        let vector_store =
            build_vector_store(&settings.vector_store, embedding.dimension()).await?;
        let llm = build_llm(&settings.llm)?;

        let knowledge = Arc::new(KnowledgeStore::with_settings(
            embedding,
            vector_store,
            IngestSettings {
                concurrency: settings.ingest.concurrency,
                embed_timeout: settings.embedding.timeout(),
                on_duplicate: settings.ingest.on_duplicate,
            },
        ));

        let rag = Arc::new(
            RagService::new(knowledge.clone(), llm, settings.rag.top_k)
                .with_template((&config.prompts.answer).into())
                .with_timeout(settings.llm.timeout()),
        );

        Ok(Self::new(knowledge, rag, config))
    }
}
