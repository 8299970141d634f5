use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// An issue and the resolution that fixed it, as supplied by a caller.
///
/// Absent fields deserialize as empty and are caught by [`IssueResolution::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueResolution {
    pub issue: String,
    pub resolution: String,
}

impl IssueResolution {
    pub fn new(issue: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            resolution: resolution.into(),
        }
    }

    /// Both fields must carry text; whitespace alone does not count.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.issue.trim().is_empty() {
            return Err(DomainError::validation("issue must not be empty"));
        }
        if self.resolution.trim().is_empty() {
            return Err(DomainError::validation("resolution must not be empty"));
        }
        Ok(())
    }

    /// The text that gets embedded and handed to the generator as context.
    pub fn document(&self) -> String {
        format!("Issue: {}\nResolution: {}", self.issue, self.resolution)
    }

    /// Derived from the trimmed issue text, so surrounding whitespace does not
    /// change the id.
    pub fn record_id(&self) -> RecordId {
        RecordId::from_issue(self.issue.trim())
    }
}

/// What to do when an ingested issue is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the stored record (upsert by id).
    #[default]
    Overwrite,
    /// Refuse the new record with a duplicate error.
    Reject,
}

/// Stable record identifier: `issue_` followed by the hex SHA-256 of the issue text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub const PREFIX: &'static str = "issue_";

    pub fn from_issue(issue: &str) -> Self {
        let digest = Sha256::digest(issue.as_bytes());
        Self(format!("{}{:x}", Self::PREFIX, digest))
    }

    /// Wraps an id read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UUID built from the first 16 digest bytes, for stores that only accept
    /// integer or UUID keys.
    pub fn to_uuid(&self) -> Uuid {
        let hex = self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0);
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = hex
                .get(i * 2..i * 2 + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .unwrap_or(0);
        }
        Uuid::from_bytes(bytes)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub issue: String,
    pub resolution: String,
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn new(pair: IssueResolution) -> Self {
        Self {
            id: pair.record_id(),
            issue: pair.issue.trim().to_string(),
            resolution: pair.resolution.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn document(&self) -> String {
        format!("Issue: {}\nResolution: {}", self.issue, self.resolution)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: Record,
    pub score: f32,
}

/// Outcome of a retrieval-augmented query.
///
/// An empty `matches` list is a normal outcome, not an error. In that case
/// the generator is never called and `answer` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub matches: Vec<SearchResult>,
    pub answer: Option<String>,
}

impl QueryResult {
    pub fn empty(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            matches: Vec::new(),
            answer: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub issue: String,
    pub error: String,
}

/// Per-row outcome of a batch ingest. Every input row is either inserted or failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub inserted: Vec<RecordId>,
    pub failed: Vec<RowFailure>,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.inserted.len() == self.total
    }
}
