//! ETL stage of the triage pipeline.
//!
//! Reads the raw messages and annotation CSV exports, joins them on message
//! id, normalizes the encoded category strings into binary label vectors,
//! repairs out-of-range values and drops duplicate rows. The cleaned rows
//! are handed to the storage layer; every cleaning decision is counted in
//! [`EtlSummary`] so operators can see what the run did to their data.

pub mod ingest;
pub mod merge;

pub use ingest::{read_categories, read_messages};
pub use merge::{merge_and_clean, EtlSummary, MergeOutcome};
