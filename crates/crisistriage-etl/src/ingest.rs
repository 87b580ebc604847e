//! CSV readers for the two raw exports.
//!
//! Both files are headered CSV. `messages.csv` carries
//! `id,message,original,genre`; `categories.csv` carries `id,categories`
//! with the encoded label string. Rows are deserialized strictly: a
//! malformed row aborts the run with its row number rather than being
//! silently dropped.

use crisistriage_core::{CategoryRecord, MessageRecord, Result, TriageError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads the messages export from `path`.
pub fn read_messages(path: &Path) -> Result<Vec<MessageRecord>> {
    let file = open(path)?;
    read_messages_from(file).map_err(|e| with_path(e, path))
}

/// Reads the annotation export from `path`.
pub fn read_categories(path: &Path) -> Result<Vec<CategoryRecord>> {
    let file = open(path)?;
    read_categories_from(file).map_err(|e| with_path(e, path))
}

/// Reads messages from any CSV source. Split out from [`read_messages`] so
/// tests can feed in-memory bytes.
pub fn read_messages_from<R: Read>(reader: R) -> Result<Vec<MessageRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        let record: MessageRecord =
            row.map_err(|e| TriageError::Ingest(format!("row {}: {e}", i + 2)))?;
        records.push(record);
    }
    Ok(records)
}

/// Reads annotation records from any CSV source.
pub fn read_categories_from<R: Read>(reader: R) -> Result<Vec<CategoryRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        let record: CategoryRecord =
            row.map_err(|e| TriageError::Ingest(format!("row {}: {e}", i + 2)))?;
        records.push(record);
    }
    Ok(records)
}

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| TriageError::Ingest(format!("cannot open {}: {e}", path.display())))
}

fn with_path(err: TriageError, path: &Path) -> TriageError {
    match err {
        TriageError::Ingest(msg) => {
            TriageError::Ingest(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
