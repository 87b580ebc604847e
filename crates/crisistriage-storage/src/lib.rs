//! SQLite persistence for the triage pipeline.
//!
//! The ETL stage replaces the `messages` table wholesale on every run; the
//! training stage reads it back. One flat table, one column per category,
//! so the data stays inspectable with any SQLite client.

mod sqlite;

pub use sqlite::{SqliteMessageRepository, MESSAGES_TABLE};
