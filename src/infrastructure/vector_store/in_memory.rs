use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{
    ports::VectorStore, DomainError, Embedding, Record, RecordId, SearchResult,
};

/// Process-local index. Contents live as long as the process does.
pub struct InMemoryVectorStore {
    records: RwLock<Vec<(Record, Embedding)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, record: &Record, embedding: &Embedding) -> Result<(), DomainError> {
        let mut store = self
            .records
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store.retain(|(r, _)| r.id != record.id);
        store.push((record.clone(), embedding.clone()));
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self
            .records
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = store
            .iter()
            .map(|(record, embedding)| SearchResult {
                record: record.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>, DomainError> {
        let store = self
            .records
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.iter().find(|(r, _)| &r.id == id).map(|(r, _)| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Record>, DomainError> {
        let store = self
            .records
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let store = self
            .records
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.len())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.records
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .clear();
        Ok(())
    }
}
