//! Timeline entry persistence. `user_id` is the partition key; every listing
//! query is scoped by it.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entry::{TimelineEntry, TimelineEntryRow};

fn to_entry(row: TimelineEntryRow) -> Result<TimelineEntry, AppError> {
    let id = row.id;
    TimelineEntry::try_from(row)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt entry {id}: {e}")))
}

fn to_entries(rows: Vec<TimelineEntryRow>) -> Result<Vec<TimelineEntry>, AppError> {
    rows.into_iter().map(to_entry).collect()
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn insert_entry(pool: &PgPool, entry: &TimelineEntry) -> Result<TimelineEntry, AppError> {
    let row: TimelineEntryRow = sqlx::query_as(
        r#"
        INSERT INTO timeline_entries
            (id, user_id, entry_type, title, description, date, media_url, transcription,
             ai_tags, sentiment, emotion_score, ai_caption, is_locked, unlock_date, category,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(entry.id)
    .bind(&entry.user_id)
    .bind(entry.entry_type.as_str())
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(entry.date)
    .bind(&entry.media_url)
    .bind(&entry.transcription)
    .bind(&entry.ai_tags)
    .bind(entry.sentiment.map(|s| s.as_str()))
    .bind(entry.emotion_score)
    .bind(&entry.ai_caption)
    .bind(entry.is_locked)
    .bind(entry.unlock_date)
    .bind(&entry.category)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .fetch_one(pool)
    .await?;

    info!("Created {} entry {} for user {}", row.entry_type, row.id, row.user_id);
    to_entry(row)
}

/// All of a user's entries, newest `date` first.
pub async fn list_entries(pool: &PgPool, user_id: &str) -> Result<Vec<TimelineEntry>, AppError> {
    let rows = sqlx::query_as::<_, TimelineEntryRow>(
        "SELECT * FROM timeline_entries WHERE user_id = $1 ORDER BY date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    to_entries(rows)
}

/// Case-insensitive substring search on title/description, or exact tag match.
pub async fn search_entries(
    pool: &PgPool,
    user_id: &str,
    term: &str,
) -> Result<Vec<TimelineEntry>, AppError> {
    let rows = sqlx::query_as::<_, TimelineEntryRow>(
        r#"
        SELECT * FROM timeline_entries
        WHERE user_id = $1
          AND (title ILIKE $2
               OR description ILIKE $2
               OR EXISTS (SELECT 1 FROM unnest(ai_tags) AS tag WHERE lower(tag) = lower($3)))
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .bind(like_pattern(term))
    .bind(term)
    .fetch_all(pool)
    .await?;
    to_entries(rows)
}

/// Applies a title/description edit. Every other field is immutable here.
pub async fn update_text_fields(
    pool: &PgPool,
    id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Option<TimelineEntry>, AppError> {
    sqlx::query_as::<_, TimelineEntryRow>(
        r#"
        UPDATE timeline_entries
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .fetch_optional(pool)
    .await?
    .map(to_entry)
    .transpose()
}

/// Deletes an entry and returns what was removed.
pub async fn delete_entry(pool: &PgPool, id: Uuid) -> Result<Option<TimelineEntry>, AppError> {
    sqlx::query_as::<_, TimelineEntryRow>("DELETE FROM timeline_entries WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(to_entry)
        .transpose()
}
