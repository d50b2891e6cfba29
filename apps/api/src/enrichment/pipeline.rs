//! Upload-time enrichment. Each AI step runs in sequence and falls back to a
//! fixed default on failure, so enrichment never fails an upload.

use bytes::Bytes;
use tracing::warn;

use crate::cognitive::{Cognitive, ImageAnalysis, SentimentResult, Transcription};
use crate::enrichment::categorize::{categorize_key_phrases, GENERAL};
use crate::models::entry::{EntryType, Sentiment};

/// Media bytes as received in the upload request.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub ai_tags: Vec<String>,
    pub transcription: Option<String>,
    pub sentiment: Sentiment,
    pub emotion_score: Option<f64>,
    pub ai_caption: Option<String>,
    pub category: Option<String>,
}

impl Default for Enrichment {
    fn default() -> Self {
        Self {
            ai_tags: Vec::new(),
            transcription: None,
            sentiment: Sentiment::Neutral,
            emotion_score: None,
            ai_caption: None,
            category: None,
        }
    }
}

pub async fn sentiment_or_fallback(cognitive: &dyn Cognitive, text: &str) -> SentimentResult {
    match cognitive.analyze_sentiment(text).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Sentiment analysis failed, using neutral default: {e}");
            SentimentResult::fallback()
        }
    }
}

async fn categories_or_fallback(cognitive: &dyn Cognitive, text: &str) -> Vec<String> {
    match cognitive.extract_key_phrases(text).await {
        Ok(phrases) => categorize_key_phrases(&phrases),
        Err(e) => {
            warn!("Key phrase extraction failed, using general category: {e}");
            vec![GENERAL.to_string()]
        }
    }
}

async fn analyze_text(cognitive: &dyn Cognitive, text: &str) -> Enrichment {
    let sentiment = sentiment_or_fallback(cognitive, text).await;
    let ai_tags = categories_or_fallback(cognitive, text).await;
    Enrichment {
        category: ai_tags.first().cloned(),
        ai_tags,
        sentiment: sentiment.sentiment,
        emotion_score: Some(sentiment.confidence),
        ..Enrichment::default()
    }
}

/// Derives tags, sentiment, transcription and caption for a new entry.
pub async fn enrich(
    cognitive: &dyn Cognitive,
    entry_type: EntryType,
    media: Option<&UploadedMedia>,
    title: &str,
    description: Option<&str>,
) -> Enrichment {
    match (entry_type, media) {
        (EntryType::Photo, Some(media)) => {
            let analysis = match cognitive.analyze_image(media.bytes.clone()).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("Image analysis failed, using default tags: {e}");
                    ImageAnalysis::fallback()
                }
            };
            Enrichment {
                ai_tags: analysis.tags,
                ai_caption: analysis.caption,
                category: Some(analysis.category),
                ..Enrichment::default()
            }
        }
        (EntryType::Voice, Some(media)) => {
            let transcription = match cognitive
                .transcribe(media.bytes.clone(), &media.content_type)
                .await
            {
                Ok(t) => t,
                Err(e) => {
                    warn!("Transcription failed: {e}");
                    return Enrichment {
                        transcription: Some(Transcription::failed().text),
                        ..Enrichment::default()
                    };
                }
            };
            let mut enrichment = analyze_text(cognitive, &transcription.text).await;
            enrichment.transcription = Some(transcription.text);
            enrichment
        }
        (EntryType::Text, _) => {
            let text = description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(title);
            analyze_text(cognitive, text).await
        }
        (_, None) => Enrichment::default(),
    }
}
