use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Photo,
    Voice,
    Text,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Photo => "photo",
            EntryType::Voice => "voice",
            EntryType::Text => "text",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(EntryType::Photo),
            "voice" => Ok(EntryType::Voice),
            "text" => Ok(EntryType::Text),
            other => Err(format!("unknown entry type '{other}'")),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Mood contribution used by the insights average: +1, -1 or 0.
    pub fn mood_value(&self) -> i32 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    /// Text analytics can also answer `mixed`; it is folded into neutral.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" | "mixed" => Ok(Sentiment::Neutral),
            other => Err(format!("unknown sentiment '{other}'")),
        }
    }
}

/// Row shape of `timeline_entries`.
#[derive(Debug, Clone, FromRow)]
pub struct TimelineEntryRow {
    pub id: Uuid,
    pub user_id: String,
    pub entry_type: String,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub media_url: Option<String>,
    pub transcription: Option<String>,
    pub ai_tags: Vec<String>,
    pub sentiment: Option<String>,
    pub emotion_score: Option<f64>,
    pub ai_caption: Option<String>,
    pub is_locked: Option<bool>,
    pub unlock_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A journal record as served to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    pub ai_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TimelineEntryRow> for TimelineEntry {
    type Error = String;

    fn try_from(row: TimelineEntryRow) -> Result<Self, Self::Error> {
        let entry_type = row.entry_type.parse::<EntryType>()?;
        let sentiment = row
            .sentiment
            .as_deref()
            .map(str::parse::<Sentiment>)
            .transpose()?;
        Ok(TimelineEntry {
            id: row.id,
            user_id: row.user_id,
            entry_type,
            title: row.title,
            description: row.description,
            date: row.date,
            media_url: row.media_url,
            transcription: row.transcription,
            ai_tags: row.ai_tags,
            sentiment,
            emotion_score: row.emotion_score,
            ai_caption: row.ai_caption,
            is_locked: row.is_locked,
            unlock_date: row.unlock_date,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TimelineEntry {
    /// Clears the capsule lock once its unlock date has passed.
    pub fn refresh_capsule(&mut self, now: DateTime<Utc>) {
        if let (Some(true), Some(unlock)) = (self.is_locked, self.unlock_date) {
            if now >= unlock {
                self.is_locked = Some(false);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn entry(date: &str, entry_type: EntryType, sentiment: Option<Sentiment>) -> TimelineEntry {
        let date = DateTime::parse_from_rfc3339(date)
            .expect("valid rfc3339")
            .with_timezone(&Utc);
        TimelineEntry {
            id: Uuid::new_v4(),
            user_id: "ada@example.com".to_string(),
            entry_type,
            title: "Memory".to_string(),
            description: None,
            date,
            media_url: None,
            transcription: None,
            ai_tags: vec![],
            sentiment,
            emotion_score: None,
            ai_caption: None,
            is_locked: None,
            unlock_date: None,
            category: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}
