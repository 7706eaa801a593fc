//! Lookup table loader for line-delimited JSON mapping files.
//!
//! Two field-name conventions exist for the same mapping:
//!
//! - authoring files: `{"prompt_occupation": ..., "completion": ...}`
//! - serving decode tables: `{"transformed_completion": ..., "completion": ...}`
//!
//! Both are read through [`LookupTable::load`] with a [`LookupSchema`]. One file
//! may carry both key fields on every line; the schema picks which one keys the table.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to read lookup file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: malformed JSON: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}: missing field '{field}'")]
    MissingField {
        path: PathBuf,
        line: usize,
        field: &'static str,
    },
}

/// Which JSON field supplies the key of each line. The value is always `completion`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupSchema {
    /// `prompt_occupation` → `completion`
    Authoring,
    /// `transformed_completion` → `completion`
    Serving,
    /// Per line: `transformed_completion` if present, else `prompt_occupation`.
    #[default]
    Auto,
}

impl LookupSchema {
    fn pick_key(self, entry: RawEntry) -> Result<(String, String), &'static str> {
        let completion = entry.completion.ok_or("completion")?;
        let key = match self {
            Self::Authoring => entry.prompt_occupation.ok_or("prompt_occupation")?,
            Self::Serving => entry
                .transformed_completion
                .ok_or("transformed_completion")?,
            Self::Auto => entry
                .transformed_completion
                .or(entry.prompt_occupation)
                .ok_or("prompt_occupation")?,
        };
        Ok((key, completion))
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    prompt_occupation: Option<String>,
    transformed_completion: Option<String>,
    completion: Option<String>,
}

/// In-memory key → code mapping. Later entries overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    /// Load a line-delimited JSON file. Keys and values are trimmed; blank lines are skipped.
    /// Any unreadable or malformed line fails the whole load.
    pub fn load(path: &Path, schema: LookupSchema) -> Result<Self, LookupError> {
        let file = File::open(path).map_err(|source| LookupError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = HashMap::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| LookupError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let raw: RawEntry =
                serde_json::from_str(&line).map_err(|source| LookupError::Malformed {
                    path: path.to_path_buf(),
                    line: line_no,
                    source,
                })?;

            let (key, value) = schema
                .pick_key(raw)
                .map_err(|field| LookupError::MissingField {
                    path: path.to_path_buf(),
                    line: line_no,
                    field,
                })?;

            entries.insert(key.trim().to_string(), value.trim().to_string());
        }

        debug!(path = %path.display(), entries = entries.len(), ?schema, "loaded lookup table");
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Exact lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Copy of the table with lowercased keys, for case-insensitive pre-matching.
    ///
    /// Keys that collide after lowercasing take the value of the source key
    /// that sorts last, so the result does not depend on hash order.
    pub fn case_folded(&self) -> Self {
        let sorted: BTreeMap<&String, &String> = self.entries.iter().collect();
        Self {
            entries: sorted
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
        }
    }

    /// Sorted, de-duplicated set of codes. This is the candidate list for suggestions.
    pub fn distinct_codes(&self) -> Vec<String> {
        self.entries
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_jsonl(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f
    }

    #[test]
    fn test_load_then_get() {
        let f = write_jsonl(&[
            r#"{"prompt_occupation": "a", "completion": "X"}"#,
            r#"{"prompt_occupation": "b", "completion": "Y"}"#,
        ]);
        let table = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap();
        assert_eq!(table.get("a"), Some("X"));
        assert_eq!(table.get("b"), Some("Y"));
        assert_eq!(table.get("c"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_serving_schema_trims_keys() {
        let f = write_jsonl(&[
            r#"{"transformed_completion": " 25-2021 \n", "completion": "Elementary School Teachers"}"#,
        ]);
        let table = LookupTable::load(f.path(), LookupSchema::Serving).unwrap();
        assert_eq!(table.get("25-2021"), Some("Elementary School Teachers"));
    }

    #[test]
    fn test_last_write_wins() {
        let f = write_jsonl(&[
            r#"{"prompt_occupation": "nurse", "completion": "Old"}"#,
            r#"{"prompt_occupation": "nurse", "completion": "New"}"#,
        ]);
        let table = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap();
        assert_eq!(table.get("nurse"), Some("New"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_auto_schema_accepts_both_conventions() {
        let f = write_jsonl(&[
            r#"{"prompt_occupation": "welder", "completion": "Welders"}"#,
            r#"{"transformed_completion": "51-4121", "completion": "Welders"}"#,
        ]);
        let table = LookupTable::load(f.path(), LookupSchema::Auto).unwrap();
        assert_eq!(table.get("welder"), Some("Welders"));
        assert_eq!(table.get("51-4121"), Some("Welders"));
    }

    #[test]
    fn test_three_field_line_keys_by_schema() {
        let f = write_jsonl(&[
            r#"{"prompt_occupation": "Teacher", "transformed_completion": "25-2021", "completion": "Elementary School Teachers"}"#,
        ]);
        let authoring = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap();
        assert_eq!(authoring.get("Teacher"), Some("Elementary School Teachers"));
        assert_eq!(authoring.get("25-2021"), None);

        let serving = LookupTable::load(f.path(), LookupSchema::Serving).unwrap();
        assert_eq!(serving.get("25-2021"), Some("Elementary School Teachers"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let f = write_jsonl(&[r#"{"prompt_occupation": "a", "completion": "X"}"#, "", "   "]);
        let table = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = LookupTable::load(Path::new("/nonexistent/finetune.jsonl"), LookupSchema::Auto)
            .unwrap_err();
        assert!(matches!(err, LookupError::Io { .. }));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let f = write_jsonl(&[
            r#"{"prompt_occupation": "a", "completion": "X"}"#,
            r#"{"prompt_occupation": "b", "#,
        ]);
        let err = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap_err();
        match err {
            LookupError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_schema_is_missing_field() {
        let f = write_jsonl(&[r#"{"prompt_occupation": "a", "completion": "X"}"#]);
        let err = LookupTable::load(f.path(), LookupSchema::Serving).unwrap_err();
        match err {
            LookupError::MissingField { field, line, .. } => {
                assert_eq!(field, "transformed_completion");
                assert_eq!(line, 1);
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_completion_is_error() {
        let f = write_jsonl(&[r#"{"prompt_occupation": "a"}"#]);
        let err = LookupTable::load(f.path(), LookupSchema::Authoring).unwrap_err();
        assert!(matches!(
            err,
            LookupError::MissingField {
                field: "completion",
                ..
            }
        ));
    }

    #[test]
    fn test_case_folded_lowercases_keys() {
        let table = LookupTable::from_entries([("Teacher", "Educator")]);
        let folded = table.case_folded();
        assert_eq!(folded.get("teacher"), Some("Educator"));
        assert_eq!(folded.get("Teacher"), None);
    }

    #[test]
    fn test_case_folded_collision_is_deterministic() {
        let table = LookupTable::from_entries([("teacher", "B"), ("TEACHER", "A")]);
        // "teacher" sorts after "TEACHER"
        assert_eq!(table.case_folded().get("teacher"), Some("B"));
    }

    #[test]
    fn test_distinct_codes_sorted_and_unique() {
        let table = LookupTable::from_entries([
            ("nurse", "Registered Nurses"),
            ("rn", "Registered Nurses"),
            ("welder", "Welders"),
            ("chef", "Chefs and Head Cooks"),
        ]);
        assert_eq!(
            table.distinct_codes(),
            vec!["Chefs and Head Cooks", "Registered Nurses", "Welders"]
        );
    }
}
