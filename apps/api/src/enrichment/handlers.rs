//! Axum route handlers for the AI analysis endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::cognitive::{CognitiveError, SentimentResult, Transcription};
use crate::enrichment::categorize::categorize_key_phrases;
use crate::enrichment::pipeline::sentiment_or_fallback;
use crate::errors::AppError;
use crate::state::AppState;

const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    #[serde(default)]
    pub audio_url: Option<String>,
}

fn require_text(text: Option<String>) -> Result<String, AppError> {
    text.filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Text is required".to_string()))
}

/// POST /api/analyze-sentiment
///
/// Any upstream failure answers with the fixed neutral default.
pub async fn handle_analyze_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SentimentResult>, AppError> {
    let Json(req) = payload?;
    let text = require_text(req.text)?;
    debug!("Analyzing sentiment for {} chars", text.len());
    Ok(Json(
        sentiment_or_fallback(state.cognitive.as_ref(), &text).await,
    ))
}

/// POST /api/categorize-text
pub async fn handle_categorize_text(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let Json(req) = payload?;
    let text = require_text(req.text)?;
    let phrases = state.cognitive.extract_key_phrases(&text).await?;
    Ok(Json(CategorizeResponse {
        categories: categorize_key_phrases(&phrases),
    }))
}

/// POST /api/transcribe
///
/// Fetches the audio (signing it first when it lives in the media container)
/// and runs it through speech-to-text.
pub async fn handle_transcribe(
    State(state): State<AppState>,
    payload: Result<Json<TranscribeRequest>, JsonRejection>,
) -> Result<Json<Transcription>, AppError> {
    let Json(req) = payload?;
    let audio_url = req
        .audio_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("Audio URL is required".to_string()))?;

    let transcription = transcribe_url(&state, &audio_url).await.map_err(|e| {
        error!("Transcription error: {e}");
        AppError::Upstream("Failed to transcribe audio".to_string())
    })?;
    Ok(Json(transcription))
}

async fn transcribe_url(state: &AppState, audio_url: &str) -> Result<Transcription, CognitiveError> {
    let fetch_url = state.media.signed_url(audio_url).await;
    let response = state.http.get(&fetch_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CognitiveError::Api {
            status: status.as_u16(),
            message: format!("Failed to fetch audio: {status}"),
        });
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| ct.starts_with("audio/"))
        .unwrap_or(DEFAULT_AUDIO_TYPE)
        .to_string();
    let audio: Bytes = response.bytes().await?;

    state.cognitive.transcribe(audio, &content_type).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_rejects_missing_and_empty() {
        assert!(require_text(None).is_err());
        assert!(require_text(Some(String::new())).is_err());
        assert_eq!(require_text(Some("hi".to_string())).unwrap(), "hi");
    }
}
