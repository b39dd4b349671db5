//! RecordStore trait: persistence of journal records.
//!
//! Records are append-only: there is no update or delete. Range queries are
//! half-open (`start <= t < end`) on each record's primary time field and
//! come back in ascending time order, ties in insertion order.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::error::StoreError;
use crate::record::{Event, Feeling, Record, RecordKind};

/// The core RecordStore trait.
///
/// Implementations: SQLite (default), in-memory (for testing).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Persist one record and return its row id.
    async fn insert(&self, record: Record) -> std::result::Result<i64, StoreError>;

    /// Persist a batch of records, all or nothing.
    async fn insert_all(&self, records: Vec<Record>) -> std::result::Result<Vec<i64>, StoreError>;

    /// Records of `kind` with `start <= time_key < end`, ascending.
    async fn query_range(
        &self,
        kind: RecordKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> std::result::Result<Vec<Record>, StoreError>;

    /// Events whose `startTime` falls in `[start, end)`.
    async fn events_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> std::result::Result<Vec<Event>, StoreError> {
        Ok(self
            .query_range(RecordKind::Event, start, end)
            .await?
            .into_iter()
            .filter_map(Record::into_event)
            .collect())
    }

    /// Feelings whose `datetime` falls in `[start, end)`.
    async fn feelings_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> std::result::Result<Vec<Feeling>, StoreError> {
        Ok(self
            .query_range(RecordKind::Feeling, start, end)
            .await?
            .into_iter()
            .filter_map(Record::into_feeling)
            .collect())
    }
}
