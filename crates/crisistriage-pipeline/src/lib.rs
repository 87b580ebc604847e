//! Pipeline orchestration.
//!
//! Two stages, run as separate binaries: [`process`] rebuilds the SQLite
//! database from the raw CSV exports, [`train`] fits and evaluates the
//! classifier against that database and writes the model artifact.

use std::path::Path;

pub mod process;
pub mod train;

/// SQLite connection URL for a database file path.
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite:{}", path.display())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
