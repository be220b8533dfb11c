use serde::Serialize;
use thiserror::Error;

/// Upload decode failure. Row-level problems never surface here (a bad row
/// is counted as rejected and skipped); this error means the file itself is
/// unusable.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv decode failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("upload is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Outcome of decoding one upload: the rows that survived cleaning plus
/// counts for the caller's summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch<T> {
    pub rows: Vec<T>,
    pub rejected: usize,
    pub total: usize,
}

impl<T> ParsedBatch<T> {
    pub fn summary(&self, processed: usize) -> UploadSummary {
        UploadSummary {
            processed,
            rejected: self.rejected,
            total: self.total,
        }
    }
}

/// Client-facing upload summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub processed: usize,
    pub rejected: usize,
    pub total: usize,
}

/// Treat empty strings and a literal `null` as absent.
pub(crate) fn clean(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Build a CSV reader over `data` with canonical settings: headers
/// required, fields trimmed, empty lines skipped.
pub(crate) fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data)
}

/// Position of a required column in the header row (case-insensitive match
/// on the exact canonical name; no column guessing).
pub(crate) fn column(
    headers: &csv::StringRecord,
    name: &'static str,
) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or(IngestError::MissingColumn(name))
}

/// Position of an optional column.
pub(crate) fn optional_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

pub(crate) fn field(record: &csv::StringRecord, index: usize) -> Option<String> {
    record.get(index).and_then(clean)
}
