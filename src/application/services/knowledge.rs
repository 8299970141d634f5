use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    BatchReport, DomainError, DuplicatePolicy, Embedding, IssueResolution, Record, RecordId,
    RowFailure, SearchResult,
};

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub concurrency: usize,
    pub embed_timeout: Duration,
    pub on_duplicate: DuplicatePolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            embed_timeout: Duration::from_secs(30),
            on_duplicate: DuplicatePolicy::Overwrite,
        }
    }
}

/// Domain operations over the vector index: ingest, list, search, reset.
pub struct KnowledgeStore {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    settings: IngestSettings,
    /// Serializes the duplicate re-check with the write that follows it.
    write_lock: Mutex<()>,
}

impl KnowledgeStore {
    pub fn new(embedding: Arc<dyn EmbeddingService>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self::with_settings(embedding, vector_store, IngestSettings::default())
    }

    pub fn with_settings(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        let settings = IngestSettings {
            concurrency: settings.concurrency.max(1),
            ..settings
        };
        Self {
            embedding,
            vector_store,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        tokio::time::timeout(self.settings.embed_timeout, self.embedding.embed(text))
            .await
            .map_err(|_| {
                DomainError::timeout(format!(
                    "embedding request exceeded {:?}",
                    self.settings.embed_timeout
                ))
            })?
    }

    async fn ensure_insertable(&self, id: &RecordId) -> Result<(), DomainError> {
        if self.settings.on_duplicate == DuplicatePolicy::Reject
            && self.vector_store.get(id).await?.is_some()
        {
            return Err(DomainError::duplicate(format!("{id} is already stored")));
        }
        Ok(())
    }

    /// Writes an embedded record. The duplicate check is repeated under the
    /// write lock since another caller may have stored the same issue while
    /// this one was embedding.
    async fn store(&self, record: &Record, embedding: &Embedding) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_insertable(&record.id).await?;
        self.vector_store.upsert(record, embedding).await
    }

    #[instrument(skip(self, pair), fields(issue = %pair.issue))]
    pub async fn add_record(&self, pair: IssueResolution) -> Result<Record, DomainError> {
        pair.validate()?;
        let record = Record::new(pair);
        self.ensure_insertable(&record.id).await?;

        let embedding = self.embed(&record.document()).await?;
        self.store(&record, &embedding).await?;

        tracing::info!(record_id = %record.id, "record stored");
        Ok(record)
    }

    /// Ingests a batch. Every row is validated before any embedding call, and a
    /// single invalid row rejects the whole batch. Past validation, rows
    /// succeed or fail individually and the report accounts for each one.
    #[instrument(skip(self, batch), fields(count = batch.len()))]
    pub async fn add_records(
        &self,
        batch: Vec<IssueResolution>,
    ) -> Result<BatchReport, DomainError> {
        for (row, pair) in batch.iter().enumerate() {
            if let Err(DomainError::Validation(msg)) = pair.validate() {
                return Err(DomainError::validation(format!("row {row}: {msg}")));
            }
        }

        let mut report = BatchReport::new(batch.len());
        let records: Vec<Record> = batch.into_iter().map(Record::new).collect();

        // Rows sharing an issue collapse onto one: the last under overwrite,
        // the first under reject.
        let mut kept_rows: HashMap<RecordId, usize> = HashMap::new();
        for (row, record) in records.iter().enumerate() {
            match self.settings.on_duplicate {
                DuplicatePolicy::Overwrite => {
                    kept_rows.insert(record.id.clone(), row);
                }
                DuplicatePolicy::Reject => {
                    kept_rows.entry(record.id.clone()).or_insert(row);
                }
            }
        }

        let mut pending = Vec::with_capacity(records.len());
        for (row, record) in records.into_iter().enumerate() {
            let kept = kept_rows.get(&record.id).copied().unwrap_or(row);

            let outcome = if kept != row {
                Err(match self.settings.on_duplicate {
                    DuplicatePolicy::Overwrite => {
                        DomainError::duplicate(format!("{} superseded by row {kept}", record.id))
                    }
                    DuplicatePolicy::Reject => DomainError::duplicate(format!(
                        "{} appears more than once in the batch, first at row {kept}",
                        record.id
                    )),
                })
            } else {
                self.ensure_insertable(&record.id).await
            };

            match outcome {
                Ok(()) => pending.push((row, record)),
                Err(e) => report.failed.push(RowFailure {
                    row,
                    issue: record.issue,
                    error: e.to_string(),
                }),
            }
        }

        let mut embedded = stream::iter(pending.into_iter().map(|(row, record)| async move {
            let embedding = self.embed(&record.document()).await;
            (row, record, embedding)
        }))
        .buffer_unordered(self.settings.concurrency);

        while let Some((row, record, embedding)) = embedded.next().await {
            let stored = match embedding {
                Ok(embedding) => self.store(&record, &embedding).await,
                Err(e) => Err(e),
            };

            match stored {
                Ok(()) => report.inserted.push(record.id),
                Err(e) => {
                    tracing::warn!(row, record_id = %record.id, error = %e, "row not stored");
                    report.failed.push(RowFailure {
                        row,
                        issue: record.issue,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.failed.sort_by_key(|f| f.row);
        tracing::info!(
            inserted = report.inserted.len(),
            failed = report.failed.len(),
            "batch ingested"
        );
        Ok(report)
    }

    /// Seeds the store, but only when it holds no records yet.
    #[instrument(skip(self, seed), fields(count = seed.len()))]
    pub async fn init_if_empty(
        &self,
        seed: Vec<IssueResolution>,
    ) -> Result<Option<BatchReport>, DomainError> {
        if self.vector_store.count().await? > 0 {
            tracing::debug!("store already populated, skipping seed");
            return Ok(None);
        }
        self.add_records(seed).await.map(Some)
    }

    #[instrument(skip(self, id), fields(record_id = %id))]
    pub async fn get(&self, id: &RecordId) -> Result<Record, DomainError> {
        self.vector_store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no stored issue with id {id}")))
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Record>, DomainError> {
        self.vector_store.list().await
    }

    #[instrument(skip(self, query))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::validation("query must not be empty"));
        }
        let embedding = self.embed(query).await?;
        self.vector_store.search(&embedding, top_k).await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.vector_store.count().await
    }

    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), DomainError> {
        self.vector_store.clear().await?;
        tracing::info!("knowledge store reset");
        Ok(())
    }
}
