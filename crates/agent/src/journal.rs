//! Journal service: chat turns plus the record store.
//!
//! Records produced by a turn are written in one batch, and only once the
//! turn has completed.

use chrono::{NaiveDateTime, Utc};
use lifechat_core::event::{DomainEvent, EventBus};
use lifechat_core::record::{Event, Feeling, Record};
use lifechat_core::store::RecordStore;
use lifechat_core::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::turn::TurnRunner;

/// The answer to one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "response")]
    pub reply: String,

    pub created_events: Vec<Event>,

    #[serde(rename = "feeling")]
    pub feelings: Vec<Feeling>,
}

pub struct Journal {
    runner: TurnRunner,
    store: Arc<dyn RecordStore>,
    event_bus: Arc<EventBus>,
}

impl Journal {
    pub fn new(runner: TurnRunner, store: Arc<dyn RecordStore>, event_bus: Arc<EventBus>) -> Self {
        Self {
            runner,
            store,
            event_bus,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Run a turn for `chat` and persist what it produced.
    pub async fn log_chat(&self, chat: &str) -> Result<ChatReply> {
        let outcome = self.runner.run(chat).await?;

        let mut batch: Vec<Record> = Vec::with_capacity(outcome.events.len() + outcome.feelings.len());
        batch.extend(outcome.events.iter().cloned().map(Record::from));
        batch.extend(outcome.feelings.iter().cloned().map(Record::from));
        self.persist(batch).await?;

        Ok(ChatReply {
            reply: outcome.reply,
            created_events: outcome.events,
            feelings: outcome.feelings,
        })
    }

    pub async fn events_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Event>> {
        Ok(self.store.events_between(start, end).await?)
    }

    pub async fn feelings_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Feeling>> {
        Ok(self.store.feelings_between(start, end).await?)
    }

    /// Store a manually entered event.
    pub async fn add_event(&self, event: Event) -> Result<Event> {
        self.persist(vec![Record::from(event.clone())]).await?;
        Ok(event)
    }

    /// Store a manually entered feeling, stamped now in the journal's timezone.
    pub async fn add_feeling(
        &self,
        feelings: impl IntoIterator<Item = impl AsRef<str>>,
        score: i64,
    ) -> Result<Feeling> {
        let now = Utc::now().with_timezone(&self.runner.timezone()).naive_local();
        let feeling = Feeling::new(feelings, score, now)?;
        self.persist(vec![Record::from(feeling.clone())]).await?;
        Ok(feeling)
    }

    async fn persist(&self, batch: Vec<Record>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let ids = self.store.insert_all(batch).await?;
        info!(count = ids.len(), store = self.store.name(), "Records stored");
        self.event_bus.publish(DomainEvent::RecordsStored {
            count: ids.len(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
