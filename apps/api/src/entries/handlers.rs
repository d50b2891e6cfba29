use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entries::store;
use crate::errors::AppError;
use crate::insights::filter::EntryFilter;
use crate::models::entry::TimelineEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

impl UserIdQuery {
    pub fn require(self) -> Result<String, AppError> {
        require_user_id(self.user_id)
    }
}

pub fn require_user_id(user_id: Option<String>) -> Result<String, AppError> {
    user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is required".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub sentiment: Option<String>,
    pub tag: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Signs media and refreshes capsule state before an entry leaves the API.
pub(crate) async fn present(state: &AppState, mut entry: TimelineEntry) -> TimelineEntry {
    entry.refresh_capsule(Utc::now());
    state.media.sign_entry(entry).await
}

/// GET /api/entries
pub async fn handle_list_entries(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<TimelineEntry>>, AppError> {
    let user_id = require_user_id(params.user_id)?;
    let filter = EntryFilter::from_params(
        params.entry_type.as_deref(),
        params.sentiment.as_deref(),
        params.tag.as_deref(),
        params.date_from.as_deref(),
        params.date_to.as_deref(),
    )
    .map_err(AppError::Validation)?;

    let entries = match params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => store::search_entries(&state.db, &user_id, term).await?,
        None => store::list_entries(&state.db, &user_id).await?,
    };
    let entries = filter.apply(entries);
    debug!("Listing {} entries for {user_id}", entries.len());

    let now = Utc::now();
    let entries = entries
        .into_iter()
        .map(|mut e| {
            e.refresh_capsule(now);
            e
        })
        .collect();
    Ok(Json(state.media.sign_entries(entries).await))
}

/// Extracts the editable fields. Non-string values are ignored.
fn editable_fields(body: &Value) -> Result<(Option<&str>, Option<&str>), AppError> {
    let title = body.get("title").and_then(Value::as_str);
    let description = body.get("description").and_then(Value::as_str);
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Title cannot be empty".to_string()));
    }
    Ok((title, description))
}

/// PATCH /api/entries/:id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TimelineEntry>, AppError> {
    let Json(body) = payload?;
    let (title, description) = editable_fields(&body)?;
    let updated = store::update_text_fields(&state.db, id, title, description)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))?;
    Ok(Json(present(&state, updated).await))
}

/// DELETE /api/entries/:id
///
/// The document goes first; blob removal is best-effort.
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = store::delete_entry(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))?;

    if let Some(media_url) = deleted.media_url.as_deref() {
        if let Err(e) = state.media.delete_by_url(media_url).await {
            warn!("Failed to delete blob for entry {id}: {e}");
        }
    }

    Ok(Json(DeleteResponse { success: true }))
}

/// GET /api/random-entry
pub async fn handle_random_entry(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TimelineEntry>, AppError> {
    let user_id = params.require()?;
    let entries = store::list_entries(&state.db, &user_id).await?;
    let picked = entries
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| AppError::NotFound("No entries found".to_string()))?;
    Ok(Json(present(&state, picked).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_editable_fields_ignores_other_keys() {
        let body = json!({"title": "New", "userId": "mallory", "aiTags": ["x"]});
        let (title, description) = editable_fields(&body).unwrap();
        assert_eq!(title, Some("New"));
        assert_eq!(description, None);
    }

    #[test]
    fn test_editable_fields_ignores_non_strings() {
        let body = json!({"title": 42, "description": "Updated"});
        let (title, description) = editable_fields(&body).unwrap();
        assert_eq!(title, None);
        assert_eq!(description, Some("Updated"));
    }

    #[test]
    fn test_editable_fields_rejects_blank_title() {
        assert!(editable_fields(&json!({"title": "   "})).is_err());
    }

    #[test]
    fn test_require_user_id() {
        assert!(require_user_id(None).is_err());
        assert!(require_user_id(Some(" ".to_string())).is_err());
        assert_eq!(require_user_id(Some("ada".to_string())).unwrap(), "ada");
    }
}
