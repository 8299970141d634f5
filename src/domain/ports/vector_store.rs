use crate::domain::{errors::DomainError, Embedding, Record, RecordId, SearchResult};
use async_trait::async_trait;

/// Nearest-neighbour index over embedded records.
///
/// `upsert` replaces any entry with the same id. Results from `search` are
/// ordered by descending score.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, record: &Record, embedding: &Embedding) -> Result<(), DomainError>;
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn get(&self, id: &RecordId) -> Result<Option<Record>, DomainError>;
    async fn list(&self) -> Result<Vec<Record>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn clear(&self) -> Result<(), DomainError>;
}
