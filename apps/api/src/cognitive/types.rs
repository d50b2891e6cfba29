use serde::{Deserialize, Serialize};

use crate::models::entry::Sentiment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScores {
    pub fn max(&self) -> f64 {
        self.positive.max(self.negative).max(self.neutral)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub scores: SentimentScores,
}

impl SentimentResult {
    /// Answer used whenever sentiment analysis is unavailable.
    pub fn fallback() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
            scores: SentimentScores {
                positive: 0.33,
                negative: 0.33,
                neutral: 0.34,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysis {
    pub tags: Vec<String>,
    pub confidence: f64,
    pub category: String,
    pub caption: Option<String>,
}

impl ImageAnalysis {
    pub fn fallback() -> Self {
        Self {
            tags: vec!["image".to_string()],
            confidence: 0.0,
            category: "general".to_string(),
            caption: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcription {
    pub text: String,
    pub confidence: f64,
    pub language: String,
}

impl Transcription {
    pub const FAILED_TEXT: &'static str = "Transcription failed";

    pub fn failed() -> Self {
        Self {
            text: Self::FAILED_TEXT.to_string(),
            confidence: 0.0,
            language: "en".to_string(),
        }
    }
}
