//! POST /api/upload: store media, then enrich and persist the entry.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::enrichment::pipeline::{enrich, UploadedMedia};
use crate::entries::handlers::present;
use crate::entries::store;
use crate::errors::AppError;
use crate::insights::filter::parse_instant;
use crate::media::{blob_key, MediaStore};
use crate::models::entry::{EntryType, TimelineEntry};
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Raw multipart form fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadFile>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub entry_type: Option<String>,
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub unlock_date: Option<String>,
}

/// Validated upload request.
#[derive(Debug)]
pub struct NewEntry {
    pub file: Option<UploadFile>,
    pub title: String,
    pub description: Option<String>,
    pub entry_type: EntryType,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub unlock_date: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl UploadForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                if !bytes.is_empty() {
                    form.file = Some(UploadFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))?;
            match name.as_str() {
                "title" => form.title = Some(value),
                "description" => form.description = Some(value),
                "type" => form.entry_type = Some(value),
                "userId" => form.user_id = Some(value),
                "date" => form.date = Some(value),
                "unlockDate" => form.unlock_date = Some(value),
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn validate(self, now: DateTime<Utc>) -> Result<NewEntry, AppError> {
        let entry_type = non_blank(self.entry_type)
            .unwrap_or_else(|| "text".to_string())
            .parse::<EntryType>()
            .map_err(AppError::Validation)?;

        if self.file.is_none() && entry_type != EntryType::Text {
            return Err(AppError::Validation("File is required".to_string()));
        }

        let (title, user_id) = match (non_blank(self.title), non_blank(self.user_id)) {
            (Some(t), Some(u)) => (t, u),
            _ => {
                return Err(AppError::Validation(
                    "Title and userId are required".to_string(),
                ))
            }
        };

        let date = match non_blank(self.date) {
            Some(raw) => parse_instant(&raw)
                .ok_or_else(|| AppError::Validation(format!("invalid date '{raw}'")))?,
            None => now,
        };
        let unlock_date = non_blank(self.unlock_date)
            .map(|raw| {
                parse_instant(&raw)
                    .ok_or_else(|| AppError::Validation(format!("invalid unlockDate '{raw}'")))
            })
            .transpose()?;

        Ok(NewEntry {
            file: if entry_type == EntryType::Text { None } else { self.file },
            title,
            description: non_blank(self.description),
            entry_type,
            user_id,
            date,
            unlock_date,
        })
    }
}

/// POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TimelineEntry>, AppError> {
    let now = Utc::now();
    let new = UploadForm::from_multipart(multipart).await?.validate(now)?;

    info!(
        "Upload received: type={} user={} file={:?} size={}",
        new.entry_type,
        new.user_id,
        new.file.as_ref().map(|f| f.file_name.as_str()),
        new.file.as_ref().map(|f| f.bytes.len()).unwrap_or(0)
    );

    let entry_id = Uuid::new_v4();
    let mut media_url = None;
    let mut media = None;
    if let Some(file) = new.file {
        let key = blob_key(&new.user_id, &entry_id, &file.file_name);
        let url = state
            .media
            .upload(&key, &file.content_type, file.bytes.clone())
            .await
            .map_err(|e| {
                error!("Blob upload failed for entry {entry_id}: {e}");
                AppError::Storage(e)
            })?;
        media_url = Some(url);
        media = Some(UploadedMedia {
            bytes: file.bytes,
            content_type: file.content_type,
        });
    }

    let enrichment = enrich(
        state.cognitive.as_ref(),
        new.entry_type,
        media.as_ref(),
        &new.title,
        new.description.as_deref(),
    )
    .await;

    let is_locked = new.unlock_date.map(|unlock| unlock > now);
    let entry = TimelineEntry {
        id: entry_id,
        user_id: new.user_id,
        entry_type: new.entry_type,
        title: new.title,
        description: new.description,
        date: new.date,
        media_url,
        transcription: enrichment.transcription,
        ai_tags: enrichment.ai_tags,
        sentiment: Some(enrichment.sentiment),
        emotion_score: enrichment.emotion_score,
        ai_caption: enrichment.ai_caption,
        is_locked,
        unlock_date: new.unlock_date,
        category: enrichment.category,
        created_at: now,
        updated_at: now,
    };

    let saved = insert_or_discard_media(&state.db, &state.media, &entry).await?;
    Ok(Json(present(&state, saved).await))
}

/// Persists the entry. If that fails, the already uploaded blob is removed
/// (best-effort) and the database error is returned.
async fn insert_or_discard_media(
    db: &PgPool,
    media: &MediaStore,
    entry: &TimelineEntry,
) -> Result<TimelineEntry, AppError> {
    match store::insert_entry(db, entry).await {
        Ok(saved) => Ok(saved),
        Err(e) => {
            if let Some(url) = entry.media_url.as_deref() {
                if let Err(cleanup) = media.delete_by_url(url).await {
                    warn!("Failed to remove blob for unsaved entry {}: {cleanup}", entry.id);
                }
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn form() -> UploadForm {
        UploadForm {
            title: Some("First day".to_string()),
            user_id: Some("ada@example.com".to_string()),
            entry_type: Some("text".to_string()),
            ..UploadForm::default()
        }
    }

    fn file() -> UploadFile {
        UploadFile {
            file_name: "beach.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from_static(b"jpeg"),
        }
    }

    #[tokio::test]
    async fn test_failed_insert_returns_database_error_after_blob_cleanup() {
        let db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy("postgres://timeline@127.0.0.1:1/timeline_test")
            .unwrap();
        let media = crate::media::test_support::store("timeline-media");
        let mut entry = crate::models::entry::fixtures::entry(
            "2024-05-01T09:00:00Z",
            EntryType::Photo,
            None,
        );
        entry.media_url = Some(format!(
            "{}/timeline-media/ada/{}/beach.jpg",
            crate::media::test_support::ENDPOINT,
            entry.id
        ));

        let err = insert_or_discard_media(&db, &media, &entry).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_text_entry_needs_no_file() {
        let new = form().validate(Utc::now()).unwrap();
        assert_eq!(new.entry_type, EntryType::Text);
        assert!(new.file.is_none());
    }

    #[test]
    fn test_photo_without_file_is_rejected() {
        let mut f = form();
        f.entry_type = Some("photo".to_string());
        let msg = validation_message(f.validate(Utc::now()).unwrap_err());
        assert_eq!(msg, "File is required");
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let mut f = form();
        f.title = Some("  ".to_string());
        let msg = validation_message(f.validate(Utc::now()).unwrap_err());
        assert_eq!(msg, "Title and userId are required");
    }

    #[test]
    fn test_missing_user_is_rejected() {
        let mut f = form();
        f.user_id = None;
        assert!(f.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut f = form();
        f.entry_type = Some("video".to_string());
        f.file = Some(file());
        assert!(f.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_text_entry_drops_stray_file() {
        let mut f = form();
        f.file = Some(file());
        assert!(f.validate(Utc::now()).unwrap().file.is_none());
    }

    #[test]
    fn test_date_defaults_to_now() {
        let now = Utc::now();
        assert_eq!(form().validate(now).unwrap().date, now);
    }

    #[test]
    fn test_explicit_dates_parse() {
        let mut f = form();
        f.date = Some("2020-06-15".to_string());
        let unlock = Utc::now() + Duration::days(365);
        f.unlock_date = Some(unlock.to_rfc3339());
        let new = f.validate(Utc::now()).unwrap();
        assert_eq!(new.date.to_rfc3339(), "2020-06-15T00:00:00+00:00");
        assert_eq!(new.unlock_date, Some(unlock));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let mut f = form();
        f.date = Some("last tuesday".to_string());
        assert!(f.validate(Utc::now()).is_err());
    }
}
