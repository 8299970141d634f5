//! Application layer - Use cases and orchestration.
//!
//! Services depend on domain ports (traits) rather than concrete
//! implementations; adapters are injected at startup.

pub mod services;

pub use services::{IngestSettings, KnowledgeStore, RagService};
