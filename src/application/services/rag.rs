use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::application::services::KnowledgeStore;
use crate::domain::{
    ports::LlmService, DomainError, PromptTemplate, QueryResult, SearchResult,
};

/// Retrieve-then-generate: nearest stored cases become the generator's context.
pub struct RagService {
    knowledge: Arc<KnowledgeStore>,
    llm: Arc<dyn LlmService>,
    template: PromptTemplate,
    default_top_k: usize,
    timeout: Duration,
}

impl RagService {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        llm: Arc<dyn LlmService>,
        default_top_k: usize,
    ) -> Self {
        Self {
            knowledge,
            llm,
            template: PromptTemplate::default(),
            default_top_k,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self, query))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.knowledge.search(query, top_k).await
    }

    /// Answers `question` from the nearest stored cases.
    ///
    /// With nothing stored the result is empty and the generator is not
    /// called. Generator failures, including an empty reply, surface as
    /// [`DomainError::Generation`]; an expired call as [`DomainError::Timeout`].
    #[instrument(skip(self, question))]
    pub async fn answer(&self, question: &str) -> Result<QueryResult, DomainError> {
        if question.trim().is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }

        let matches = self.retrieve(question).await?;
        if matches.is_empty() {
            tracing::info!("no stored issues to ground an answer");
            return Ok(QueryResult::empty(question));
        }

        let prompt = self.template.render(&matches, question);
        tracing::debug!(matches = matches.len(), prompt_len = prompt.len(), "prompt built");

        let answer = tokio::time::timeout(self.timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| {
                DomainError::timeout(format!("answer generation exceeded {:?}", self.timeout))
            })??;

        if answer.trim().is_empty() {
            return Err(DomainError::generation("generator returned an empty answer"));
        }

        Ok(QueryResult {
            question: question.to_string(),
            matches,
            answer: Some(answer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{BagOfWordsEmbedding, RecordingLlm, Reply};
    use crate::domain::IssueResolution;
    use crate::infrastructure::InMemoryVectorStore;

    fn knowledge(embedding: Arc<BagOfWordsEmbedding>) -> Arc<KnowledgeStore> {
        Arc::new(KnowledgeStore::new(embedding, Arc::new(InMemoryVectorStore::new())))
    }

    async fn seeded(knowledge: &KnowledgeStore) {
        knowledge
            .add_records(vec![
                IssueResolution::new("printer offline", "restart print spooler"),
                IssueResolution::new("vpn disconnects every hour", "update the vpn client"),
                IssueResolution::new("outlook keeps asking for password", "clear cached credentials"),
                IssueResolution::new("laptop battery drains fast", "lower screen brightness"),
                IssueResolution::new("wifi slow in meeting room", "move to the 5ghz network"),
                IssueResolution::new("cannot map network drive", "reconnect with full UNC path"),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_answer_empty_store_skips_generator() {
        let llm = Arc::new(RecordingLlm::new(Reply::Fixed("unused".into())));
        let rag = RagService::new(knowledge(Arc::new(BagOfWordsEmbedding::new())), llm.clone(), 5);

        let result = rag.answer("my printer won't print").await.unwrap();

        assert!(result.is_empty());
        assert!(result.answer.is_none());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_printer_example() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let llm = Arc::new(RecordingLlm::new(Reply::EchoResolutions));
        let rag = RagService::new(store, llm.clone(), 5);

        let result = rag.answer("my printer won't print").await.unwrap();

        assert_eq!(result.matches.len(), 5);
        assert!(result.matches[0].record.resolution.contains("restart print spooler"));
        assert!(result.answer.unwrap().contains("restart print spooler"));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_contains_context_and_question() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let llm = Arc::new(RecordingLlm::new(Reply::Fixed("- restart print spooler".into())));
        let rag = RagService::new(store, llm.clone(), 5);

        rag.answer("my printer won't print").await.unwrap();
        let prompt = llm.last_prompt().unwrap();

        assert!(prompt.contains("using ONLY the information above"));
        assert!(prompt.contains("Issue: printer offline\nResolution: restart print spooler"));
        assert!(prompt.contains("I don't know based on the stored issues"));
        assert!(prompt.trim_end().ends_with("my printer won't print"));
    }

    #[tokio::test]
    async fn test_custom_template() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let llm = Arc::new(RecordingLlm::new(Reply::Fixed("ok".into())));
        let rag = RagService::new(store, llm.clone(), 1)
            .with_template(PromptTemplate::new("Q={question}\n{context}"));

        rag.answer("printer offline").await.unwrap();

        assert_eq!(
            llm.last_prompt().unwrap(),
            "Q=printer offline\nIssue: printer offline\nResolution: restart print spooler"
        );
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let rag = RagService::new(store, Arc::new(RecordingLlm::new(Reply::Fail)), 5);

        let err = rag.answer("printer offline").await.unwrap_err();
        assert!(matches!(err, DomainError::Generation(_)));
    }

    #[tokio::test]
    async fn test_empty_generation_is_failure() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let rag = RagService::new(store, Arc::new(RecordingLlm::new(Reply::Fixed("  ".into()))), 5);

        let err = rag.answer("printer offline").await.unwrap_err();
        assert!(matches!(err, DomainError::Generation(_)));
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let store = knowledge(Arc::new(BagOfWordsEmbedding::new()));
        seeded(&store).await;
        let llm = Arc::new(RecordingLlm::new(Reply::Slow(Duration::from_secs(5))));
        let rag = RagService::new(store, llm, 5).with_timeout(Duration::from_millis(20));

        let err = rag.answer("printer offline").await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_not_generation_failure() {
        let embedding = Arc::new(BagOfWordsEmbedding::failing_on("printer"));
        let store = knowledge(embedding);
        store
            .add_record(IssueResolution::new("vpn drops", "update client"))
            .await
            .unwrap();
        let llm = Arc::new(RecordingLlm::new(Reply::Fixed("unused".into())));
        let rag = RagService::new(store, llm.clone(), 5);

        let err = rag.answer("printer offline").await.unwrap_err();

        assert!(matches!(err, DomainError::Embedding(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let llm = Arc::new(RecordingLlm::new(Reply::Fixed("unused".into())));
        let rag = RagService::new(knowledge(Arc::new(BagOfWordsEmbedding::new())), llm, 5);

        let err = rag.answer("   ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
