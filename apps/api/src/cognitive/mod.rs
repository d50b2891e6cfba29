//! Cognitive client. Every call to Azure Cognitive Services goes through here.
//!
//! Covers text analytics (sentiment, key phrases), computer vision (image
//! analysis) and speech-to-text. Routes and the upload pipeline only see the
//! `Cognitive` trait, carried in `AppState` as `Arc<dyn Cognitive>`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::CognitiveConfig;
use crate::models::entry::Sentiment;

pub mod types;

pub use types::{ImageAnalysis, SentimentResult, SentimentScores, Transcription};

const TEXT_ANALYTICS_PATH: &str = "text/analytics/v3.1";
const VISION_ANALYZE_PATH: &str = "vision/v3.2/analyze?visualFeatures=Tags,Description,Categories";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const DEFAULT_SPEECH_CONFIDENCE: f64 = 0.8;
const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";

#[derive(Debug, Error)]
pub enum CognitiveError {
    #[error("{0} service is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),
}

#[async_trait]
pub trait Cognitive: Send + Sync {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, CognitiveError>;

    async fn extract_key_phrases(&self, text: &str) -> Result<Vec<String>, CognitiveError>;

    async fn analyze_image(&self, image: Bytes) -> Result<ImageAnalysis, CognitiveError>;

    async fn transcribe(
        &self,
        audio: Bytes,
        content_type: &str,
    ) -> Result<Transcription, CognitiveError>;
}

// ── Text analytics wire format ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DocumentBatch<'a> {
    documents: [InputDocument<'a>; 1],
}

#[derive(Debug, Serialize)]
struct InputDocument<'a> {
    id: &'a str,
    language: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDocument {
    sentiment: String,
    confidence_scores: SentimentScores,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPhraseDocument {
    #[serde(default)]
    key_phrases: Vec<String>,
}

impl<T> DocumentResponse<T> {
    fn into_first(self) -> Result<T, CognitiveError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(CognitiveError::Document(err.error.message));
        }
        self.documents
            .into_iter()
            .next()
            .ok_or_else(|| CognitiveError::Document("empty document response".to_string()))
    }
}

fn sentiment_from_document(doc: SentimentDocument) -> Result<SentimentResult, CognitiveError> {
    let sentiment: Sentiment = doc.sentiment.parse().map_err(CognitiveError::Document)?;
    Ok(SentimentResult {
        sentiment,
        confidence: doc.confidence_scores.max(),
        scores: doc.confidence_scores,
    })
}

// ── Vision wire format ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct VisionResponse {
    #[serde(default)]
    tags: Vec<VisionTag>,
    #[serde(default)]
    categories: Vec<VisionCategory>,
    description: Option<VisionDescription>,
}

#[derive(Debug, Deserialize)]
struct VisionTag {
    name: Option<String>,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct VisionCategory {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisionDescription {
    #[serde(default)]
    captions: Vec<VisionCaption>,
}

#[derive(Debug, Deserialize)]
struct VisionCaption {
    text: String,
    #[serde(default)]
    confidence: f64,
}

fn image_analysis_from_response(resp: VisionResponse) -> ImageAnalysis {
    let confidence = resp.tags.first().map(|t| t.confidence).unwrap_or(0.0);
    let tags = resp
        .tags
        .into_iter()
        .filter_map(|t| t.name)
        .filter(|n| !n.is_empty())
        .collect();
    let category = resp
        .categories
        .into_iter()
        .next()
        .and_then(|c| c.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "general".to_string());
    let caption = resp.description.and_then(|d| {
        d.captions
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| c.text)
    });

    ImageAnalysis {
        tags,
        confidence,
        category,
        caption,
    }
}

// ── Speech wire format ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpeechResponse {
    recognition_status: String,
    display_text: Option<String>,
    #[serde(default, rename = "NBest")]
    n_best: Vec<SpeechCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpeechCandidate {
    confidence: Option<f64>,
    display: Option<String>,
}

fn transcription_from_response(resp: SpeechResponse) -> Result<Transcription, CognitiveError> {
    if resp.recognition_status != "Success" {
        return Err(CognitiveError::Recognition(resp.recognition_status));
    }
    let best = resp.n_best.into_iter().next();
    let confidence = best
        .as_ref()
        .and_then(|c| c.confidence)
        .unwrap_or(DEFAULT_SPEECH_CONFIDENCE);
    let text = resp
        .display_text
        .or_else(|| best.and_then(|c| c.display))
        .unwrap_or_default();

    Ok(Transcription {
        text,
        confidence,
        language: DEFAULT_SPEECH_LANGUAGE.to_string(),
    })
}

// ── Client ──────────────────────────────────────────────────────────────────

/// REST client for Azure Cognitive Services.
#[derive(Clone)]
pub struct AzureCognitive {
    client: Client,
    config: CognitiveConfig,
}

impl AzureCognitive {
    pub fn new(client: Client, config: CognitiveConfig) -> Self {
        Self { client, config }
    }

    async fn text_analytics<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        text: &str,
    ) -> Result<T, CognitiveError> {
        if self.config.text_endpoint.is_empty() || self.config.text_key.is_empty() {
            return Err(CognitiveError::NotConfigured("text analytics"));
        }
        let url = format!(
            "{}/{TEXT_ANALYTICS_PATH}/{operation}",
            self.config.text_endpoint.trim_end_matches('/')
        );
        let body = DocumentBatch {
            documents: [InputDocument {
                id: "1",
                language: "en",
                text,
            }],
        };

        let response = self
            .client
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.text_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let parsed: DocumentResponse<T> = response.json().await?;
        parsed.into_first()
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CognitiveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CognitiveError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Cognitive for AzureCognitive {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, CognitiveError> {
        let doc: SentimentDocument = self.text_analytics("sentiment", text).await?;
        let result = sentiment_from_document(doc)?;
        debug!(
            "Sentiment analyzed: {} ({:.2})",
            result.sentiment.as_str(),
            result.confidence
        );
        Ok(result)
    }

    async fn extract_key_phrases(&self, text: &str) -> Result<Vec<String>, CognitiveError> {
        let doc: KeyPhraseDocument = self.text_analytics("keyPhrases", text).await?;
        debug!("Extracted {} key phrases", doc.key_phrases.len());
        Ok(doc.key_phrases)
    }

    async fn analyze_image(&self, image: Bytes) -> Result<ImageAnalysis, CognitiveError> {
        if self.config.vision_endpoint.is_empty() || self.config.vision_key.is_empty() {
            return Err(CognitiveError::NotConfigured("vision"));
        }
        let url = format!(
            "{}/{VISION_ANALYZE_PATH}",
            self.config.vision_endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.vision_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await?;
        let response = check_status(response).await?;
        let parsed: VisionResponse = response.json().await?;
        Ok(image_analysis_from_response(parsed))
    }

    async fn transcribe(
        &self,
        audio: Bytes,
        content_type: &str,
    ) -> Result<Transcription, CognitiveError> {
        if self.config.speech_region.is_empty() || self.config.speech_key.is_empty() {
            return Err(CognitiveError::NotConfigured("speech"));
        }
        let url = format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={DEFAULT_SPEECH_LANGUAGE}&format=detailed",
            self.config.speech_region
        );
        let response = self
            .client
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.speech_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(audio)
            .send()
            .await?;
        let response = check_status(response).await?;
        let parsed: SpeechResponse = response.json().await?;
        transcription_from_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentiment_document_takes_max_confidence() {
        let resp: DocumentResponse<SentimentDocument> = serde_json::from_value(json!({
            "documents": [{
                "id": "1",
                "sentiment": "positive",
                "confidenceScores": {"positive": 0.87, "neutral": 0.1, "negative": 0.03}
            }],
            "errors": []
        }))
        .unwrap();
        let result = sentiment_from_document(resp.into_first().unwrap()).unwrap();
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert!((result.confidence - 0.87).abs() < f64::EPSILON);
    }

    #[test]
    fn test_document_error_surfaces() {
        let resp: DocumentResponse<SentimentDocument> = serde_json::from_value(json!({
            "documents": [],
            "errors": [{"id": "1", "error": {"code": "InvalidDocument", "message": "Document text is empty."}}]
        }))
        .unwrap();
        let err = resp.into_first().unwrap_err();
        assert!(err.to_string().contains("Document text is empty"));
    }

    #[test]
    fn test_key_phrases_parse() {
        let resp: DocumentResponse<KeyPhraseDocument> = serde_json::from_value(json!({
            "documents": [{"id": "1", "keyPhrases": ["graduation day", "family dinner"], "warnings": []}],
            "errors": []
        }))
        .unwrap();
        assert_eq!(resp.into_first().unwrap().key_phrases.len(), 2);
    }

    #[test]
    fn test_image_analysis_picks_first_category_and_best_caption() {
        let resp: VisionResponse = serde_json::from_value(json!({
            "tags": [{"name": "beach", "confidence": 0.98}, {"name": "sky", "confidence": 0.9}],
            "categories": [{"name": "outdoor_water", "score": 0.8}],
            "description": {"captions": [
                {"text": "a beach", "confidence": 0.4},
                {"text": "people on a sunny beach", "confidence": 0.7}
            ]}
        }))
        .unwrap();
        let analysis = image_analysis_from_response(resp);
        assert_eq!(analysis.tags, vec!["beach", "sky"]);
        assert_eq!(analysis.category, "outdoor_water");
        assert_eq!(analysis.caption.as_deref(), Some("people on a sunny beach"));
        assert!((analysis.confidence - 0.98).abs() < f64::EPSILON);
    }

    #[test]
    fn test_image_analysis_defaults_when_empty() {
        let analysis = image_analysis_from_response(VisionResponse::default());
        assert!(analysis.tags.is_empty());
        assert_eq!(analysis.category, "general");
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn test_transcription_success() {
        let resp: SpeechResponse = serde_json::from_value(json!({
            "RecognitionStatus": "Success",
            "DisplayText": "Today I got the job.",
            "NBest": [{"Confidence": 0.93, "Display": "Today I got the job."}]
        }))
        .unwrap();
        let t = transcription_from_response(resp).unwrap();
        assert_eq!(t.text, "Today I got the job.");
        assert!((t.confidence - 0.93).abs() < f64::EPSILON);
        assert_eq!(t.language, "en-US");
    }

    #[test]
    fn test_transcription_default_confidence() {
        let resp: SpeechResponse = serde_json::from_value(json!({
            "RecognitionStatus": "Success",
            "DisplayText": "Hello."
        }))
        .unwrap();
        assert_eq!(transcription_from_response(resp).unwrap().confidence, 0.8);
    }

    #[test]
    fn test_transcription_no_match_is_error() {
        let resp: SpeechResponse =
            serde_json::from_value(json!({"RecognitionStatus": "NoMatch"})).unwrap();
        assert!(matches!(
            transcription_from_response(resp),
            Err(CognitiveError::Recognition(s)) if s == "NoMatch"
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_not_configured() {
        let client = AzureCognitive::new(Client::new(), CognitiveConfig::default());
        let err = client.analyze_sentiment("hello").await.unwrap_err();
        assert!(matches!(err, CognitiveError::NotConfigured("text analytics")));
    }
}
