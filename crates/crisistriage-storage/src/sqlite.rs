//! SQLite-backed message repository.

use crisistriage_core::{
    CategoryVector, LabeledMessage, Result, TriageError, CATEGORY_COUNT, CATEGORY_NAMES,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::debug;

/// Table holding the cleaned, labeled messages.
pub const MESSAGES_TABLE: &str = "messages";

/// Rows inserted per statement; 40 binds per row keeps this well under
/// SQLite's bind-variable limit.
const INSERT_CHUNK: usize = 500;

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Repository over a SQLite database identified by URL, e.g.
/// `sqlite:data/triage.db` or `sqlite::memory:`.
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    /// Opens (and creates, if needed) the database behind `database_url`.
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                TriageError::Storage(format!("invalid database URL '{database_url}': {e}"))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // In-memory databases are private to their connection; more than
        // one pool connection would see different data.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                TriageError::Storage(format!("cannot open database '{database_url}': {e}"))
            })?;
        Ok(SqliteMessageRepository { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Drops and recreates the messages table, then inserts `rows` in one
    /// transaction. A failed run leaves the previous table untouched only
    /// up to the drop; callers treat this as a full rebuild.
    pub async fn replace_all(&self, rows: &[LabeledMessage]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {MESSAGES_TABLE}"))
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        sqlx::query(&create_table_sql())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(insert_prefix());
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.id)
                    .push_bind(&row.message)
                    .push_bind(row.original.as_deref())
                    .push_bind(&row.genre);
                for k in 0..CATEGORY_COUNT {
                    b.push_bind(i64::from(row.labels.get(k)));
                }
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        debug!(rows = rows.len(), "replaced {MESSAGES_TABLE} table");
        Ok(())
    }

    /// Loads every stored message in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<LabeledMessage>> {
        self.ensure_table().await?;
        let sql = format!(
            "SELECT id, message, original, genre, {} FROM {MESSAGES_TABLE}",
            CATEGORY_NAMES.join(", ")
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        rows.iter().map(row_to_message).collect()
    }

    /// Number of stored messages.
    pub async fn count(&self) -> Result<i64> {
        self.ensure_table().await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {MESSAGES_TABLE}"))
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(count)
    }

    async fn ensure_table(&self) -> Result<()> {
        let found = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(MESSAGES_TABLE)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        if found.is_none() {
            return Err(TriageError::Storage(format!(
                "table '{MESSAGES_TABLE}' does not exist; run the ETL stage first"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQL builders
// ---------------------------------------------------------------------------

fn create_table_sql() -> String {
    let mut sql = format!(
        "CREATE TABLE {MESSAGES_TABLE} (\n    id INTEGER NOT NULL,\n    message TEXT NOT NULL,\n    original TEXT,\n    genre TEXT NOT NULL"
    );
    for name in CATEGORY_NAMES {
        sql.push_str(",\n    ");
        sql.push_str(name);
        sql.push_str(" INTEGER NOT NULL");
    }
    sql.push_str("\n)");
    sql
}

fn insert_prefix() -> String {
    format!(
        "INSERT INTO {MESSAGES_TABLE} (id, message, original, genre, {}) ",
        CATEGORY_NAMES.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn row_to_message(row: &SqliteRow) -> Result<LabeledMessage> {
    let id: i64 = row.try_get("id").map_err(storage_error)?;
    let message: String = row.try_get("message").map_err(storage_error)?;
    let original: Option<String> = row.try_get("original").map_err(storage_error)?;
    let genre: String = row.try_get("genre").map_err(storage_error)?;

    let mut labels = CategoryVector::zeros();
    for (k, name) in CATEGORY_NAMES.iter().enumerate() {
        let value: i64 = row.try_get(*name).map_err(storage_error)?;
        match value {
            0 | 1 => labels.set(k, value as u8),
            other => {
                return Err(TriageError::Storage(format!(
                    "message {id}: column {name} holds {other}, expected 0 or 1"
                )))
            }
        }
    }
    Ok(LabeledMessage {
        id,
        message,
        original,
        genre,
        labels,
    })
}

fn storage_error(e: sqlx::Error) -> TriageError {
    TriageError::Storage(e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
