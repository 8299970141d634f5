mod embedding;
mod record;

pub use embedding::Embedding;
pub use record::{
    BatchReport, DuplicatePolicy, IssueResolution, QueryResult, Record, RecordId, RowFailure, SearchResult,
};
