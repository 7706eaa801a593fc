//! Decoding raw model output into human-readable codes.

use serde::Serialize;
use tracing::info;

use crate::completion::{CompletionError, CompletionModel};
use crate::lookup::LookupTable;

/// Outcome of one successful model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub raw_output: String,
    /// `None` when the decode table has no entry for the raw output.
    pub decoded_output: Option<String>,
}

impl ClassificationResult {
    /// A raw output with no decode entry is treated as a likely hallucination.
    pub fn hallucination_suspected(&self) -> bool {
        self.decoded_output.is_none()
    }
}

/// Look up a raw model output. Blank output never matches.
pub fn decode<'a>(raw: &str, table: &'a LookupTable) -> Option<&'a str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    table.get(raw)
}

/// Send a title to the model and decode the answer.
pub async fn classify_title(
    model: &dyn CompletionModel,
    table: &LookupTable,
    title: &str,
) -> Result<ClassificationResult, CompletionError> {
    let raw_output = model.complete(title.trim()).await?;
    let decoded_output = decode(&raw_output, table).map(str::to_string);

    info!(
        raw = %raw_output,
        decoded = decoded_output.is_some(),
        "classified occupation title"
    );

    Ok(ClassificationResult {
        raw_output,
        decoded_output,
    })
}
