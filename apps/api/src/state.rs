use std::sync::Arc;

use sqlx::PgPool;

use crate::cognitive::Cognitive;
use crate::media::MediaStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub media: MediaStore,
    /// Azure Cognitive Services by default; swapped for a scripted double in tests.
    pub cognitive: Arc<dyn Cognitive>,
    /// Plain HTTP client for fetching remote audio before transcription.
    pub http: reqwest::Client,
}
