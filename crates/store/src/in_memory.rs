//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lifechat_core::error::StoreError;
use lifechat_core::record::{Record, RecordKind};
use lifechat_core::store::RecordStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps records in a Vec, in insertion order.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<(i64, Record)>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, record: Record) -> Result<i64, StoreError> {
        let mut records = self.records.write().await;
        let id = records.len() as i64 + 1;
        records.push((id, record));
        Ok(id)
    }

    async fn insert_all(&self, batch: Vec<Record>) -> Result<Vec<i64>, StoreError> {
        let mut records = self.records.write().await;
        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            let id = records.len() as i64 + 1;
            records.push((id, record));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn query_range(
        &self,
        kind: RecordKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read().await;
        let mut hits: Vec<&(i64, Record)> = records
            .iter()
            .filter(|(_, r)| r.kind() == kind)
            .filter(|(_, r)| {
                let t = r.time_key();
                start <= t && t < end
            })
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        hits.sort_by_key(|(_, r)| r.time_key());
        Ok(hits.into_iter().map(|(_, r)| r.clone()).collect())
    }
}
