mod knowledge;
mod rag;

#[cfg(test)]
pub(crate) mod test_support;

pub use knowledge::{IngestSettings, KnowledgeStore};
pub use rag::RagService;
