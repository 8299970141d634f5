//! Two-column CSV ingest boundary.
//!
//! The header row must name an `issue` and a `resolution` column (any order,
//! case-insensitive, extra columns ignored). Header problems are reported
//! before a single row is handed to the knowledge store.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

use crate::domain::{DomainError, IssueResolution};

pub const ISSUE_COLUMN: &str = "issue";
pub const RESOLUTION_COLUMN: &str = "resolution";

pub fn parse_issue_csv<R: Read>(reader: R) -> Result<Vec<IssueResolution>, DomainError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| DomainError::validation(format!("unreadable CSV header: {e}")))?
        .clone();
    let (issue_idx, resolution_idx) = column_indices(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record
            .map_err(|e| DomainError::validation(format!("CSV row {}: {e}", i + 1)))?;
        rows.push(IssueResolution::new(
            record.get(issue_idx).unwrap_or_default(),
            record.get(resolution_idx).unwrap_or_default(),
        ));
    }

    Ok(rows)
}

pub fn read_issue_csv(path: &Path) -> Result<Vec<IssueResolution>, DomainError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DomainError::validation(format!("cannot open {}: {e}", path.display())))?;
    parse_issue_csv(file)
}

fn column_indices(headers: &StringRecord) -> Result<(usize, usize), DomainError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
    };

    match (find(ISSUE_COLUMN), find(RESOLUTION_COLUMN)) {
        (Some(issue), Some(resolution)) => Ok((issue, resolution)),
        (issue, resolution) => {
            let missing: Vec<&str> = [
                issue.is_none().then_some(ISSUE_COLUMN),
                resolution.is_none().then_some(RESOLUTION_COLUMN),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(DomainError::validation(format!(
                "CSV must have '{ISSUE_COLUMN}' and '{RESOLUTION_COLUMN}' columns; missing: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let data = "issue,resolution\nprinter offline,restart print spooler\nvpn drops,update client\n";
        let rows = parse_issue_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], IssueResolution::new("printer offline", "restart print spooler"));
        assert_eq!(rows[1].resolution, "update client");
    }

    #[test]
    fn test_parse_reordered_and_extra_columns() {
        let data = "Resolution, Category ,ISSUE\n\"reset password, then log in\",accounts,locked out\n";
        let rows = parse_issue_csv(data.as_bytes()).unwrap();

        assert_eq!(rows, vec![IssueResolution::new("locked out", "reset password, then log in")]);
    }

    #[test]
    fn test_parse_missing_column() {
        let data = "issue,fix\nprinter offline,restart print spooler\n";
        let err = parse_issue_csv(data.as_bytes()).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(err.to_string().contains("missing: resolution"));
    }

    #[test]
    fn test_parse_empty_input() {
        let err = parse_issue_csv("".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing: issue, resolution"));
    }

    #[test]
    fn test_parse_bom_header() {
        let data = "\u{feff}issue,resolution\na,b\n";
        let rows = parse_issue_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_parse_ragged_row() {
        let data = "issue,resolution\nonly one field\n";
        let err = parse_issue_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.csv");
        std::fs::write(&path, "issue,resolution\nmonitor flickers,replace cable\n").unwrap();

        let rows = read_issue_csv(&path).unwrap();
        assert_eq!(rows[0].issue, "monitor flickers");
    }
}
