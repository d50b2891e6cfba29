use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::entry::{EntryType, Sentiment, TimelineEntry};

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Upper bound for a `dateTo` value. A bare date covers the whole day.
fn parse_upper_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_instant(raw)?
        .checked_add_signed(Duration::days(1))?
        .checked_sub_signed(Duration::nanoseconds(1))
}

fn unless_all(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Dashboard filters. Every bound is inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub sentiment: Option<Sentiment>,
    pub tag: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Builds a filter from raw query values; `"all"` and blanks mean no filter.
    pub fn from_params(
        entry_type: Option<&str>,
        sentiment: Option<&str>,
        tag: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self, String> {
        let entry_type = unless_all(entry_type)
            .map(str::parse::<EntryType>)
            .transpose()?;
        let sentiment = unless_all(sentiment)
            .map(str::parse::<Sentiment>)
            .transpose()?;
        let tag = tag
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let date_from = unless_all(date_from)
            .map(|d| parse_instant(d).ok_or_else(|| format!("invalid dateFrom '{d}'")))
            .transpose()?;
        let date_to = unless_all(date_to)
            .map(|d| parse_upper_bound(d).ok_or_else(|| format!("invalid dateTo '{d}'")))
            .transpose()?;

        Ok(Self {
            entry_type,
            sentiment,
            tag,
            date_from,
            date_to,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, entry: &TimelineEntry) -> bool {
        if self.entry_type.is_some_and(|t| t != entry.entry_type) {
            return false;
        }
        if self.sentiment.is_some() && entry.sentiment != self.sentiment {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !entry.ai_tags.iter().any(|t| t.to_lowercase().contains(tag)) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| entry.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| entry.date > to) {
            return false;
        }
        true
    }

    pub fn apply(&self, entries: Vec<TimelineEntry>) -> Vec<TimelineEntry> {
        if self.is_empty() {
            return entries;
        }
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}
