use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeleteCollectionBuilder, Distance,
    GetPointsBuilder, PointId, PointStruct, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;

use crate::domain::{
    ports::VectorStore, DomainError, Embedding, Record, RecordId, SearchResult,
};

const SCROLL_PAGE_SIZE: u32 = 256;

/// Persistent index backed by a Qdrant collection using cosine distance.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantVectorStore {
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::external(e.to_string()))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            tracing::info!(collection = %self.collection, dimension = self.dimension, "creating collection");
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        Ok(())
    }

    fn point_id(id: &RecordId) -> PointId {
        PointId::from(id.to_uuid().to_string())
    }
}

fn record_payload(record: &Record) -> Result<Payload, DomainError> {
    serde_json::json!({
        "record_id": record.id.as_str(),
        "issue": record.issue,
        "resolution": record.resolution,
        "document": record.document(),
        "created_at": record.created_at.to_rfc3339(),
    })
    .try_into()
    .map_err(|_| DomainError::internal("Failed to create payload"))
}

fn record_from_payload(payload: &HashMap<String, Value>) -> Option<Record> {
    let id = RecordId::from_raw(payload.get("record_id")?.as_str()?.as_str());
    let issue = payload.get("issue")?.as_str()?.to_string();
    let resolution = payload.get("resolution")?.as_str()?.to_string();
    let created_at = payload
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(Record {
        id,
        issue,
        resolution,
        created_at,
    })
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, record: &Record, embedding: &Embedding) -> Result<(), DomainError> {
        let point = PointStruct::new(
            Self::point_id(&record.id),
            embedding.as_slice().to_vec(),
            record_payload(record)?,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let record = record_from_payload(&point.payload)?;
                Some(SearchResult {
                    record,
                    score: point.score,
                })
            })
            .collect())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>, DomainError> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![Self::point_id(id)])
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .find_map(|point| record_from_payload(&point.payload)))
    }

    async fn list(&self) -> Result<Vec<Record>, DomainError> {
        let mut records = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut request = ScrollPointsBuilder::new(&self.collection)
                .limit(SCROLL_PAGE_SIZE)
                .with_payload(true);
            if let Some(next) = offset.take() {
                request = request.offset(next);
            }

            let page = self
                .client
                .scroll(request)
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;

            records.extend(
                page.result
                    .iter()
                    .filter_map(|point| record_from_payload(&point.payload)),
            );

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.client
            .delete_collection(DeleteCollectionBuilder::new(&self.collection))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        self.ensure_collection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueResolution;

    #[test]
    fn test_payload_round_trip() {
        let record = Record::new(IssueResolution::new("printer offline", "restart print spooler"));
        let payload: HashMap<String, Value> = record_payload(&record).unwrap().into();

        let restored = record_from_payload(&payload).unwrap();
        assert_eq!(restored.id, record.id);
        assert_eq!(restored.issue, record.issue);
        assert_eq!(restored.resolution, record.resolution);
        assert_eq!(restored.created_at.timestamp(), record.created_at.timestamp());
    }

    #[test]
    fn test_payload_missing_fields() {
        let payload: HashMap<String, Value> = HashMap::new();
        assert!(record_from_payload(&payload).is_none());
    }

    #[test]
    fn test_point_id_is_stable() {
        let id = RecordId::from_issue("vpn drops");
        assert_eq!(QdrantVectorStore::point_id(&id), QdrantVectorStore::point_id(&id));
    }
}
