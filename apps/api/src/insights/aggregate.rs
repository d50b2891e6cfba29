use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::models::entry::{EntryType, Sentiment, TimelineEntry};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MonthlyEmotions {
    pub month: String,
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SentimentCount {
    pub sentiment: Sentiment,
    pub label: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub total_entries: usize,
    pub mood_average: f64,
    pub monthly: Vec<MonthlyEmotions>,
    pub sentiments: Vec<SentimentCount>,
    pub top_tags: Vec<TagCount>,
    pub entries_per_year: BTreeMap<i32, usize>,
    pub entries_per_type: BTreeMap<&'static str, usize>,
}

/// Display label shown next to a sentiment.
pub fn emotion_label(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "Happy",
        Sentiment::Negative => "Reflective",
        Sentiment::Neutral => "Neutral",
    }
}

pub fn group_by_year(entries: &[TimelineEntry]) -> BTreeMap<i32, Vec<&TimelineEntry>> {
    let mut years: BTreeMap<i32, Vec<&TimelineEntry>> = BTreeMap::new();
    for entry in entries {
        years.entry(entry.date.year()).or_default().push(entry);
    }
    years
}

/// Per-month sentiment tallies keyed `YYYY-MM`, ascending. Entries without a
/// sentiment count as neutral.
pub fn emotions_by_month(entries: &[TimelineEntry]) -> Vec<MonthlyEmotions> {
    let mut months: BTreeMap<String, MonthlyEmotions> = BTreeMap::new();
    for entry in entries {
        let key = format!("{}-{:02}", entry.date.year(), entry.date.month());
        let bucket = months.entry(key.clone()).or_insert_with(|| MonthlyEmotions {
            month: key,
            ..MonthlyEmotions::default()
        });
        bucket.count += 1;
        match entry.sentiment.unwrap_or(Sentiment::Neutral) {
            Sentiment::Positive => bucket.positive += 1,
            Sentiment::Negative => bucket.negative += 1,
            Sentiment::Neutral => bucket.neutral += 1,
        }
    }
    months.into_values().collect()
}

pub fn sentiment_distribution(entries: &[TimelineEntry]) -> Vec<SentimentCount> {
    [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]
        .into_iter()
        .map(|s| SentimentCount {
            sentiment: s,
            label: emotion_label(s),
            count: entries
                .iter()
                .filter(|e| e.sentiment.unwrap_or(Sentiment::Neutral) == s)
                .count() as u32,
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Mean of +1 (positive), -1 (negative) and 0 per entry. 0.0 when empty.
pub fn mood_average(entries: &[TimelineEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let sum: i32 = entries
        .iter()
        .map(|e| e.sentiment.map(|s| s.mood_value()).unwrap_or(0))
        .sum();
    sum as f64 / entries.len() as f64
}

/// Tags ranked by frequency (descending), ties alphabetical.
pub fn tag_frequencies(entries: &[TimelineEntry], limit: usize) -> Vec<TagCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for tag in entries.iter().flat_map(|e| e.ai_tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(limit);
    ranked
}

pub fn build_report(entries: &[TimelineEntry], tag_limit: usize) -> InsightsReport {
    let entries_per_year = group_by_year(entries)
        .into_iter()
        .map(|(year, list)| (year, list.len()))
        .collect();

    let mut entries_per_type = BTreeMap::new();
    for kind in [EntryType::Photo, EntryType::Voice, EntryType::Text] {
        let n = entries.iter().filter(|e| e.entry_type == kind).count();
        entries_per_type.insert(kind.as_str(), n);
    }

    InsightsReport {
        total_entries: entries.len(),
        mood_average: mood_average(entries),
        monthly: emotions_by_month(entries),
        sentiments: sentiment_distribution(entries),
        top_tags: tag_frequencies(entries, tag_limit),
        entries_per_year,
        entries_per_type,
    }
}
