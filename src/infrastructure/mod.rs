pub mod config;
pub mod csv_import;
pub mod embedding;
pub mod llm;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use csv_import::{parse_issue_csv, read_issue_csv};
pub use embedding::TextEmbedding;
pub use llm::{build_llm, AnthropicLlm, OpenAiLlm};
pub use vector_store::{build_vector_store, InMemoryVectorStore, QdrantVectorStore};
