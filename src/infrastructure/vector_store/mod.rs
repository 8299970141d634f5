mod in_memory;
mod qdrant;

use std::sync::Arc;

use crate::domain::{ports::VectorStore, DomainError};
use crate::infrastructure::config::{VectorBackend, VectorStoreConfig};

pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

/// Opens the index selected by `vector_store.backend`.
pub async fn build_vector_store(
    config: &VectorStoreConfig,
    dimension: usize,
) -> Result<Arc<dyn VectorStore>, DomainError> {
    match config.backend {
        VectorBackend::Memory => {
            tracing::info!("using in-memory vector store; records are lost on restart");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
        VectorBackend::Qdrant => {
            let store =
                QdrantVectorStore::new(&config.qdrant_url, &config.collection, dimension).await?;
            tracing::info!(url = %config.qdrant_url, collection = %config.collection, "Qdrant connected");
            Ok(Arc::new(store))
        }
    }
}
