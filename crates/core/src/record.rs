//! Journal records: the Event and Feeling schema.
//!
//! Records are stored with naive local timestamps in the configured
//! timezone. Both types deserialize through validating conversions, so an
//! out-of-range score or an event that ends before it starts can never be
//! built from JSON.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use crate::error::RecordError;

/// Something the user did, with a time span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventFields")]
pub struct Event {
    /// Calendar day of the event
    pub date: NaiveDate,

    #[serde(rename = "startTime")]
    pub start_time: NaiveDateTime,

    #[serde(rename = "endTime")]
    pub end_time: NaiveDateTime,

    /// Free text description
    pub description: String,

    /// Short labels, order irrelevant
    pub tags: Vec<String>,

    /// Short title
    pub name: String,
}

impl Event {
    /// Build an event, checking that it does not end before it starts.
    pub fn new(
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        description: impl Into<String>,
        tags: Vec<String>,
        name: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if end_time < start_time {
            return Err(RecordError::EndBeforeStart {
                start: start_time.to_string(),
                end: end_time.to_string(),
            });
        }
        Ok(Self {
            date: start_time.date(),
            start_time,
            end_time,
            description: description.into(),
            tags,
            name: name.into(),
        })
    }

    /// Override the calendar day (it normally follows `start_time`).
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

#[derive(Deserialize)]
struct EventFields {
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<EventFields> for Event {
    type Error = RecordError;

    fn try_from(fields: EventFields) -> Result<Self, Self::Error> {
        let start = parse_local_timestamp(&fields.start_time)?;
        let end = parse_local_timestamp(&fields.end_time)?;
        let name = fields
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| fields.description.clone());
        let event = Event::new(start, end, fields.description, fields.tags, name)?;
        match fields.date {
            Some(raw) => Ok(event.with_date(parse_local_timestamp(&raw)?.date())),
            None => Ok(event),
        }
    }
}

/// How the user felt at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FeelingFields")]
pub struct Feeling {
    /// Emotion labels, never empty
    pub feelings: Vec<String>,

    /// Intensity, 1..=10
    pub score: u8,

    pub datetime: NaiveDateTime,
}

impl Feeling {
    pub const MIN_SCORE: i64 = 1;
    pub const MAX_SCORE: i64 = 10;

    /// Build a feeling from raw labels, validating the score range.
    ///
    /// Labels are trimmed, lower-cased and de-duplicated; blank labels are
    /// dropped. At least one label must survive.
    pub fn new(
        feelings: impl IntoIterator<Item = impl AsRef<str>>,
        score: i64,
        datetime: NaiveDateTime,
    ) -> Result<Self, RecordError> {
        if !(Self::MIN_SCORE..=Self::MAX_SCORE).contains(&score) {
            return Err(RecordError::ScoreOutOfRange(score));
        }
        let feelings = normalize_labels(feelings);
        if feelings.is_empty() {
            return Err(RecordError::EmptyFeelings);
        }
        Ok(Self {
            feelings,
            score: score as u8,
            datetime,
        })
    }
}

#[derive(Deserialize)]
struct FeelingFields {
    feelings: Vec<String>,
    score: i64,
    datetime: String,
}

impl TryFrom<FeelingFields> for Feeling {
    type Error = RecordError;

    fn try_from(fields: FeelingFields) -> Result<Self, Self::Error> {
        let datetime = parse_local_timestamp(&fields.datetime)?;
        Feeling::new(fields.feelings, fields.score, datetime)
    }
}

fn normalize_labels(labels: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim().to_lowercase();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

/// The two kinds of journal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    Feeling,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Feeling => "feeling",
        }
    }
}

/// Either kind of record, for the store interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Event(Event),
    Feeling(Feeling),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Event(_) => RecordKind::Event,
            Self::Feeling(_) => RecordKind::Feeling,
        }
    }

    /// The primary time field: `startTime` for events, `datetime` for feelings.
    pub fn time_key(&self) -> NaiveDateTime {
        match self {
            Self::Event(e) => e.start_time,
            Self::Feeling(f) => f.datetime,
        }
    }

    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Event(e) => Some(e),
            Self::Feeling(_) => None,
        }
    }

    pub fn into_feeling(self) -> Option<Feeling> {
        match self {
            Self::Feeling(f) => Some(f),
            Self::Event(_) => None,
        }
    }
}

impl From<Event> for Record {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

impl From<Feeling> for Record {
    fn from(feeling: Feeling) -> Self {
        Self::Feeling(feeling)
    }
}

/// Parse a timestamp into naive local time.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS[.fff]]` (or a space instead of `T`) and a bare
/// `YYYY-MM-DD` (midnight). A trailing `Z` or numeric UTC offset is stripped,
/// not applied: `08:00:00+02:00` becomes `08:00:00`.
pub fn parse_local_timestamp(raw: &str) -> Result<NaiveDateTime, RecordError> {
    let s = strip_utc_offset(raw.trim());
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| RecordError::InvalidTimestamp(raw.to_string()))
}

fn strip_utc_offset(s: &str) -> &str {
    if let Some(stripped) = s.strip_suffix(['Z', 'z']) {
        return stripped;
    }
    // Offsets only ever follow the time part; the first 10 bytes are the date.
    match s.get(10..).and_then(|time| time.rfind(['+', '-'])) {
        Some(pos) => &s[..10 + pos],
        None => s,
    }
}
