// CSV store of collected postings. Append-only: existing rows are never
// rewritten and the header is written once, when the file is created.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::AppError;
use crate::models::job::{POSTING_COLUMNS, PostingRecord};

/// Append `records` to the store at `path`, creating it with a header row
/// when it is missing or empty. Returns the number of rows written.
pub fn persist(path: &Path, records: &[PostingRecord]) -> Result<usize, AppError> {
    let has_content = std::fs::metadata(path)
        .map(|m| m.len() > 0)
        .unwrap_or(false);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !has_content {
        writer.write_record(POSTING_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::info!("Saved {} postings to {}", records.len(), path.display());
    Ok(records.len())
}

/// Read every posting back from the store, in file order.
pub fn load(path: &Path) -> Result<Vec<PostingRecord>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<PostingRecord>, csv::Error>>()?;
    Ok(records)
}
