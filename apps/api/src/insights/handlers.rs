use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::entries::handlers::{present, require_user_id, UserIdQuery};
use crate::entries::store;
use crate::errors::AppError;
use crate::insights::aggregate::{build_report, InsightsReport};
use crate::insights::calendar::{entries_by_day, month_matrix, MonthMatrix};
use crate::models::entry::TimelineEntry;
use crate::state::AppState;

const TOP_TAGS: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    pub user_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub weeks: MonthMatrix,
    pub days: BTreeMap<u32, Vec<TimelineEntry>>,
}

/// GET /api/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InsightsReport>, AppError> {
    let user_id = params.require()?;
    let entries = store::list_entries(&state.db, &user_id).await?;
    Ok(Json(build_report(&entries, TOP_TAGS)))
}

/// GET /api/calendar
///
/// Defaults to the current month.
pub async fn handle_calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let user_id = require_user_id(params.user_id)?;
    let today = Utc::now().date_naive();
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());
    let weeks = month_matrix(year, month)
        .ok_or_else(|| AppError::Validation(format!("invalid month {year}-{month}")))?;

    let entries = store::list_entries(&state.db, &user_id).await?;
    let mut days = BTreeMap::new();
    for (day, list) in entries_by_day(&entries, year, month) {
        let mut presented = Vec::with_capacity(list.len());
        for entry in list {
            presented.push(present(&state, entry).await);
        }
        days.insert(day, presented);
    }

    Ok(Json(CalendarResponse {
        year,
        month,
        weeks,
        days,
    }))
}
