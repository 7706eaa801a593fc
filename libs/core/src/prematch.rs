//! Batch pre-matching of a CSV column against a lookup table.
//!
//! Each non-missing cell of the selected column is lowercased, trimmed and
//! looked up exactly. Hits get the mapped code plus a method tag; misses and
//! missing cells leave both output cells empty. All input columns pass
//! through untouched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::lookup::{LookupSchema, LookupTable};

pub const DEFAULT_OUTPUT_COLUMN: &str = "final_output";
pub const DEFAULT_METHOD_COLUMN: &str = "method";
pub const PRE_MATCH_METHOD: &str = "pre_match";
/// Pre-matching compares occupation titles, so tables are keyed on
/// `prompt_occupation` even when a line also carries a model label.
pub const TABLE_SCHEMA: LookupSchema = LookupSchema::Authoring;

#[derive(Debug, Error)]
pub enum PrematchError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("column {0} not found in CSV header")]
    UnknownColumn(String),

    #[error("could not move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Which input column holds the occupation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Name(String),
    Index(usize),
}

impl ColumnSelector {
    /// Resolve against a header row, returning the column position.
    pub fn resolve(&self, headers: &StringRecord) -> Result<usize, PrematchError> {
        match self {
            Self::Name(name) => headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PrematchError::UnknownColumn(format!("'{name}'"))),
            Self::Index(idx) if *idx < headers.len() => Ok(*idx),
            Self::Index(idx) => Err(PrematchError::UnknownColumn(format!(
                "#{idx} (header has {} columns)",
                headers.len()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrematchOptions {
    pub column: ColumnSelector,
    pub output_column: String,
    pub method_column: String,
}

impl PrematchOptions {
    pub fn new(column: ColumnSelector) -> Self {
        Self {
            column,
            output_column: DEFAULT_OUTPUT_COLUMN.to_string(),
            method_column: DEFAULT_METHOD_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrematchSummary {
    pub rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub missing: usize,
}

/// Resolve one cell against a case-folded table. Empty cells count as missing.
pub fn prematch_value<'a>(value: Option<&str>, folded: &'a LookupTable) -> Option<&'a str> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    folded.get(&value.to_lowercase())
}

/// Stream `reader` to `writer`, appending the output and method columns.
///
/// If the header already has a column with the output or method name, that
/// column is overwritten in place instead of appended twice.
pub fn prematch_csv<R: Read, W: Write>(
    reader: R,
    writer: W,
    table: &LookupTable,
    options: &PrematchOptions,
) -> Result<PrematchSummary, PrematchError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = options.column.resolve(&headers)?;

    let folded = table.case_folded();
    let mut header_out: Vec<String> = headers.iter().map(str::to_string).collect();
    let output_pos = slot_for(&mut header_out, &options.output_column);
    let method_pos = slot_for(&mut header_out, &options.method_column);
    let width = header_out.len();

    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(&header_out)?;

    let mut summary = PrematchSummary::default();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record)? {
        summary.rows += 1;

        let cell = record.get(column);
        let hit = prematch_value(cell, &folded);
        match (cell.map(str::trim), hit) {
            (_, Some(_)) => summary.matched += 1,
            (Some(v), None) if !v.is_empty() => summary.unmatched += 1,
            _ => summary.missing += 1,
        }

        let mut row: Vec<&str> = record.iter().collect();
        row.resize(width, "");
        row[output_pos] = hit.unwrap_or("");
        row[method_pos] = if hit.is_some() { PRE_MATCH_METHOD } else { "" };
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    info!(
        rows = summary.rows,
        matched = summary.matched,
        unmatched = summary.unmatched,
        missing = summary.missing,
        "pre-match complete"
    );
    Ok(summary)
}

/// Read `input`, pre-match, and write `output`. Nothing is written on failure.
pub fn prematch_file(
    input: &Path,
    output: &Path,
    table: &LookupTable,
    options: &PrematchOptions,
) -> Result<PrematchSummary, PrematchError> {
    let reader = File::open(input).map_err(|source| PrematchError::Io {
        path: input.to_path_buf(),
        source,
    })?;

    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| PrematchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let summary = prematch_csv(reader, &mut tmp, table, options)?;
    tmp.persist(output)?;
    Ok(summary)
}

/// Header row of a CSV file, for interactive column selection.
pub fn read_headers(path: &Path) -> Result<Vec<String>, PrematchError> {
    let file = File::open(path).map_err(|source| PrematchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
    Ok(rdr.headers()?.iter().map(str::to_string).collect())
}

fn slot_for(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(pos) => pos,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}
