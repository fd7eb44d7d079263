//! Input dataset loading.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::entry::BenchmarkEntry;
use crate::error::{DriverError, DriverResult};

/// A dataset row: either a decoded entry, or the reason it could not be
/// decoded. Undecodable rows keep their index so the log layout stays
/// aligned with the input file.
#[derive(Debug)]
pub enum DatasetRow {
    Entry(BenchmarkEntry),
    Invalid(String),
}

/// Load the JSON array dataset into memory.
///
/// A missing file or a top-level document that is not an array is fatal.
/// Individual rows that fail to decode are kept as [`DatasetRow::Invalid`].
pub fn load_entries(path: &Path) -> DriverResult<Vec<DatasetRow>> {
    if !path.exists() {
        return Err(DriverError::DataFileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let rows: Vec<Value> = serde_json::from_str(&content)?;

    let rows: Vec<DatasetRow> = rows
        .into_iter()
        .enumerate()
        .map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => DatasetRow::Entry(entry),
            Err(e) => {
                warn!(index, error = %e, "Entry could not be decoded");
                DatasetRow::Invalid(e.to_string())
            }
        })
        .collect();

    info!(path = %path.display(), entries = rows.len(), "Loaded dataset");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_entries(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, DriverError::DataFileNotFound(_)));
    }

    #[test]
    fn test_not_an_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(&path, r#"{"repo": "a/b"}"#).unwrap();
        assert!(matches!(load_entries(&path).unwrap_err(), DriverError::Json(_)));
    }

    #[test]
    fn test_loads_entries_and_keeps_invalid_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(
            &path,
            r#"[
                {"repo": "a/b", "base_commit": "abc", "created_at": "2023-01-01"},
                {"repo": 12},
                {"repo": "c/d", "commit_hash": "def", "FAIL_TO_PASS": "[]"}
            ]"#,
        )
        .unwrap();

        let rows = load_entries(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(matches!(&rows[0], DatasetRow::Entry(e) if e.repo.as_deref() == Some("a/b")));
        assert!(matches!(rows[1], DatasetRow::Invalid(_)));
        assert!(matches!(&rows[2], DatasetRow::Entry(e) if e.commit_hash.as_deref() == Some("def")));
    }

    #[test]
    fn test_empty_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(load_entries(&path).unwrap().is_empty());
    }
}
