//! In-process fakes for the provider ports.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{
    ports::{EmbeddingService, LlmService},
    DomainError, Embedding,
};

const DIMENSION: usize = 256;

/// Deterministic bag-of-words embedding: each lowercase word is hashed into a
/// bucket, so texts sharing words end up close under cosine similarity.
pub struct BagOfWordsEmbedding {
    calls: AtomicUsize,
    fail_when_contains: Option<String>,
    delay: Option<Duration>,
    delay_when_contains: Option<String>,
}

impl BagOfWordsEmbedding {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_when_contains: None,
            delay: None,
            delay_when_contains: None,
        }
    }

    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            fail_when_contains: Some(needle.into()),
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Delays only texts containing `needle`.
    pub fn slow_on(needle: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            delay_when_contains: Some(needle.into()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vec[(bucket % DIMENSION as u64) as usize] += 1.0;
        }
        Embedding::new(vec)
    }
}

#[async_trait]
impl EmbeddingService for BagOfWordsEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            let matches = self
                .delay_when_contains
                .as_deref()
                .map_or(true, |needle| text.contains(needle));
            if matches {
                tokio::time::sleep(delay).await;
            }
        }
        if let Some(needle) = &self.fail_when_contains {
            if text.contains(needle.as_str()) {
                return Err(DomainError::embedding("rate limited"));
            }
        }
        Ok(Self::vectorize(text))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

pub enum Reply {
    /// Lists every `Resolution:` line found in the prompt as a bullet.
    EchoResolutions,
    Fixed(String),
    Fail,
    Slow(Duration),
}

/// Answer generator that records the prompts it receives.
pub struct RecordingLlm {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmService for RecordingLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.reply {
            Reply::EchoResolutions => Ok(prompt
                .lines()
                .filter_map(|line| line.strip_prefix("Resolution: "))
                .map(|r| format!("- {r}"))
                .collect::<Vec<_>>()
                .join("\n")),
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Fail => Err(DomainError::generation("quota exceeded")),
            Reply::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
        }
    }
}
