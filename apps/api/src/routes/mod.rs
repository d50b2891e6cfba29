pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::enrichment::handlers as enrichment;
use crate::entries::{handlers as entries, upload};
use crate::insights::handlers as insights;
use crate::prompts;
use crate::state::AppState;

/// Photos and voice notes are buffered in memory; cap the request size.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Entries
        .route(
            "/api/upload",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/entries", get(entries::handle_list_entries))
        .route(
            "/api/entries/:id",
            patch(entries::handle_update_entry).delete(entries::handle_delete_entry),
        )
        .route("/api/random-entry", get(entries::handle_random_entry))
        // AI analysis
        .route(
            "/api/analyze-sentiment",
            post(enrichment::handle_analyze_sentiment),
        )
        .route(
            "/api/categorize-text",
            post(enrichment::handle_categorize_text),
        )
        .route("/api/transcribe", post(enrichment::handle_transcribe))
        .route("/api/generate-prompt", get(prompts::handle_generate_prompt))
        // Views
        .route("/api/insights", get(insights::handle_insights))
        .route("/api/calendar", get(insights::handle_calendar))
        .with_state(state)
}
