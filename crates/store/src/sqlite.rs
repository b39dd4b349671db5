//! SQLite record store.
//!
//! One database file with two append-only tables:
//! - `events`  : what the user did, keyed on `start_time`
//! - `feelings`: how the user felt, keyed on `datetime`
//!
//! Timestamps are stored as fixed-width local-time text, so lexical order in
//! SQL matches chronological order.

use crate::TIMESTAMP_FORMAT;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use lifechat_core::error::StoreError;
use lifechat_core::record::{Event, Feeling, Record, RecordKind, parse_local_timestamp};
use lifechat_core::store::RecordStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// SQLite-backed [`RecordStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every in-memory connection is its own database; keep exactly one alive
        let pool_options = if path.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite record store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                date         TEXT NOT NULL,
                start_time   TEXT NOT NULL,
                end_time     TEXT NOT NULL,
                description  TEXT NOT NULL,
                tags         TEXT NOT NULL DEFAULT '[]',
                name         TEXT NOT NULL,
                CHECK (end_time >= start_time)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("events table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feelings (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                feelings  TEXT NOT NULL,
                score     INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10),
                datetime  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("feelings table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_time)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("events index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_feelings_datetime ON feelings(datetime)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("feelings index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Total rows across both tables.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM events) + (SELECT COUNT(*) FROM feelings) AS n",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("count: {e}")))?;
        row.try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count: {e}")))
    }
}

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

async fn insert_one(conn: &mut SqliteConnection, record: &Record) -> Result<i64, StoreError> {
    let result = match record {
        Record::Event(event) => {
            let tags = serde_json::to_string(&event.tags)
                .map_err(|e| StoreError::Storage(format!("tags: {e}")))?;
            sqlx::query(
                "INSERT INTO events (date, start_time, end_time, description, tags, name) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(event.date.format("%Y-%m-%d").to_string())
            .bind(format_ts(event.start_time))
            .bind(format_ts(event.end_time))
            .bind(&event.description)
            .bind(tags)
            .bind(&event.name)
            .execute(&mut *conn)
            .await
        }
        Record::Feeling(feeling) => {
            let labels = serde_json::to_string(&feeling.feelings)
                .map_err(|e| StoreError::Storage(format!("feelings: {e}")))?;
            sqlx::query("INSERT INTO feelings (feelings, score, datetime) VALUES (?, ?, ?)")
                .bind(labels)
                .bind(i64::from(feeling.score))
                .bind(format_ts(feeling.datetime))
                .execute(&mut *conn)
                .await
        }
    };
    result
        .map(|r| r.last_insert_rowid())
        .map_err(|e| StoreError::Storage(format!("insert {}: {e}", record.kind().as_str())))
}

fn column<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::QueryFailed(format!("column {name}: {e}")))
}

fn parse_ts(raw: &str) -> Result<NaiveDateTime, StoreError> {
    parse_local_timestamp(raw).map_err(|e| StoreError::QueryFailed(e.to_string()))
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<Event, StoreError> {
    let date: String = column(row, "date")?;
    let tags: String = column(row, "tags")?;
    let start: String = column(row, "start_time")?;
    let end: String = column(row, "end_time")?;
    let tags: Vec<String> = serde_json::from_str(&tags).unwrap_or_default();
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| StoreError::QueryFailed(format!("date: {e}")))?;

    let event = Event::new(
        parse_ts(&start)?,
        parse_ts(&end)?,
        column::<String>(row, "description")?,
        tags,
        column::<String>(row, "name")?,
    )
    .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    Ok(event.with_date(date))
}

fn row_to_feeling(row: &sqlx::sqlite::SqliteRow) -> Result<Feeling, StoreError> {
    let labels: String = column(row, "feelings")?;
    let labels: Vec<String> = serde_json::from_str(&labels)
        .map_err(|e| StoreError::QueryFailed(format!("feelings: {e}")))?;
    let datetime: String = column(row, "datetime")?;
    Feeling::new(labels, column::<i64>(row, "score")?, parse_ts(&datetime)?)
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, record: Record) -> Result<i64, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Storage(format!("acquire: {e}")))?;
        let id = insert_one(&mut *conn, &record).await?;
        debug!(id, kind = record.kind().as_str(), "Record stored");
        Ok(id)
    }

    async fn insert_all(&self, records: Vec<Record>) -> Result<Vec<i64>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            match insert_one(&mut *tx, record).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    warn!(error = %e, "Batch insert failed; rolling back");
                    // Dropping the transaction rolls it back
                    return Err(e);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;
        debug!(count = ids.len(), "Record batch stored");
        Ok(ids)
    }

    async fn query_range(
        &self,
        kind: RecordKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Record>, StoreError> {
        let sql = match kind {
            RecordKind::Event => {
                "SELECT id, date, start_time, end_time, description, tags, name FROM events \
                 WHERE start_time >= ? AND start_time < ? ORDER BY start_time ASC, id ASC"
            }
            RecordKind::Feeling => {
                "SELECT id, feelings, score, datetime FROM feelings \
                 WHERE datetime >= ? AND datetime < ? ORDER BY datetime ASC, id ASC"
            }
        };

        let rows = sqlx::query(sql)
            .bind(format_ts(start))
            .bind(format_ts(end))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("{} range: {e}", kind.as_str())))?;

        rows.iter()
            .map(|row| match kind {
                RecordKind::Event => row_to_event(row).map(Record::from),
                RecordKind::Feeling => row_to_feeling(row).map(Record::from),
            })
            .collect()
    }
}
