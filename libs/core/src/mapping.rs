//! Human-confirmed profession → code mappings collected during a labeling session.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Please enter a profession.")]
    EmptyProfession,

    #[error("Please select a code.")]
    EmptyCode,

    #[error("No mapping at position {index} (have {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("No mappings to export.")]
    NothingToExport,

    #[error("serialize mapping: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One exported line. Uses the authoring field names so the loader reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub prompt_occupation: String,
    pub completion: String,
}

/// Ordered, in-memory list of confirmed mappings.
#[derive(Debug, Clone, Default)]
pub struct MappingSession {
    records: Vec<MappingRecord>,
}

impl MappingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping. Both sides are trimmed and must be non-empty.
    pub fn add(&mut self, profession: &str, code: &str) -> Result<&MappingRecord, MappingError> {
        let profession = profession.trim();
        let code = code.trim();
        if profession.is_empty() {
            return Err(MappingError::EmptyProfession);
        }
        if code.is_empty() {
            return Err(MappingError::EmptyCode);
        }

        self.records.push(MappingRecord {
            prompt_occupation: profession.to_string(),
            completion: code.to_string(),
        });
        info!(profession, code, total = self.records.len(), "mapping added");
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn remove(&mut self, index: usize) -> Result<MappingRecord, MappingError> {
        if index >= self.records.len() {
            return Err(MappingError::OutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    pub fn records(&self) -> &[MappingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render as line-delimited JSON, one record per line, trailing newline included.
    pub fn to_jsonl(&self) -> Result<String, MappingError> {
        if self.records.is_empty() {
            return Err(MappingError::NothingToExport);
        }
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn export(&self, path: &Path) -> Result<(), MappingError> {
        let body = self.to_jsonl()?;
        fs::write(path, body).map_err(|source| MappingError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), count = self.records.len(), "exported mappings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupSchema, LookupTable};

    #[test]
    fn test_add_trims_and_keeps_order() {
        let mut session = MappingSession::new();
        session.add("  Line cook ", "Cooks, Restaurant").unwrap();
        session.add("RN", "Registered Nurses").unwrap();
        let records = session.records();
        assert_eq!(records[0].prompt_occupation, "Line cook");
        assert_eq!(records[1].completion, "Registered Nurses");
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let mut session = MappingSession::new();
        assert!(matches!(
            session.add(" ", "Welders"),
            Err(MappingError::EmptyProfession)
        ));
        assert!(matches!(
            session.add("welder", ""),
            Err(MappingError::EmptyCode)
        ));
        assert!(session.is_empty());
    }

    #[test]
    fn test_remove_by_index() {
        let mut session = MappingSession::new();
        session.add("a", "X").unwrap();
        session.add("b", "Y").unwrap();
        let removed = session.remove(0).unwrap();
        assert_eq!(removed.prompt_occupation, "a");
        assert_eq!(session.len(), 1);
        assert!(matches!(
            session.remove(5),
            Err(MappingError::OutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_empty_export_is_error() {
        let session = MappingSession::new();
        assert!(matches!(
            session.to_jsonl(),
            Err(MappingError::NothingToExport)
        ));
    }

    #[test]
    fn test_jsonl_uses_authoring_field_names() {
        let mut session = MappingSession::new();
        session.add("baker", "Bakers").unwrap();
        let jsonl = session.to_jsonl().unwrap();
        assert_eq!(
            jsonl,
            "{\"prompt_occupation\":\"baker\",\"completion\":\"Bakers\"}\n"
        );
    }

    #[test]
    fn test_export_reload_round_trip() {
        let mut session = MappingSession::new();
        session.add("Teacher", "Educator").unwrap();
        session.add("line cook", "Cooks, Restaurant").unwrap();
        session.add("welder \"journeyman\"", "Welders").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prematch.jsonl");
        session.export(&path).unwrap();

        let reloaded = LookupTable::load(&path, LookupSchema::Authoring).unwrap();
        let expected = LookupTable::from_entries(
            session
                .records()
                .iter()
                .map(|r| (r.prompt_occupation.clone(), r.completion.clone())),
        );
        assert_eq!(reloaded, expected);
    }
}
