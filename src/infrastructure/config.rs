use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{prompt::DEFAULT_ANSWER_TEMPLATE, DuplicatePolicy, PromptTemplate};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Everything the binaries need, loaded once at startup and passed down.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads the YAML files named by `CONFIG_PATH` / `PROMPTS_PATH` (falling back
    /// to defaults when a file is absent), then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());

        let mut config: Config = read_yaml_or_default(Path::new(&config_path))?;
        let prompts: PromptsConfig = read_yaml_or_default(Path::new(&prompts_path))?;

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(Self { config, prompts })
    }

    pub fn from_yaml(config: &str, prompts: &str) -> Result<Self, ConfigError> {
        let config: Config = parse_yaml(config, Path::new("<config>"))?;
        let prompts: PromptsConfig = parse_yaml(prompts, Path::new("<prompts>"))?;
        config.validate()?;
        Ok(Self { config, prompts })
    }
}

fn read_yaml_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(T::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&raw, path)
}

fn parse_yaml<T>(raw: &str, path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub ingest: IngestConfig,
    pub vector_store: VectorStoreConfig,
    pub cors: CorsConfig,
}

impl Config {
    /// Applies environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT is not a port: {port}")))?;
        }
        if let Some(backend) = lookup("VECTOR_STORE") {
            self.vector_store.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => VectorBackend::Memory,
                "qdrant" => VectorBackend::Qdrant,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "VECTOR_STORE must be memory or qdrant, got {other}"
                    )))
                }
            };
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.qdrant_url = url;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = match provider.to_ascii_lowercase().as_str() {
                "openai" => LlmProvider::OpenAi,
                "anthropic" => LlmProvider::Anthropic,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "LLM_PROVIDER must be openai or anthropic, got {other}"
                    )))
                }
            };
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(path) = lookup("SEED_CSV") {
            self.ingest.seed_csv = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be at least 1".into()));
        }
        if self.ingest.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "ingest.concurrency must be at least 1".into(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be at least 1".into(),
            ));
        }
        if self.embedding.timeout_seconds == 0 || self.llm.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if !(self.llm.temperature > 0.0 && self.llm.temperature <= 2.0) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be in (0, 2], got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.4,
            max_tokens: 1024,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub concurrency: usize,
    pub on_duplicate: DuplicatePolicy,
    pub seed_csv: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            on_duplicate: DuplicatePolicy::Overwrite,
            seed_csv: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub qdrant_url: String,
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "issues_collection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub answer: AnswerPromptConfig,
}

/// Template for the grounded answer prompt. `{context}` and `{question}` are
/// substituted once each, in a single pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerPromptConfig {
    pub template: String,
    pub context_separator: String,
}

impl Default for AnswerPromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            context_separator: "\n\n".to_string(),
        }
    }
}

impl From<&AnswerPromptConfig> for PromptTemplate {
    fn from(config: &AnswerPromptConfig) -> Self {
        PromptTemplate::new(config.template.clone()).with_separator(config.context_separator.clone())
    }
}
