use anyhow::{Context, Result};

/// Default blob container for uploaded media.
pub const DEFAULT_MEDIA_BUCKET: &str = "timeline-media";

/// Presigned S3 URLs cannot outlive one week.
const MAX_MEDIA_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub media_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Lifetime of signed media URLs handed to clients.
    pub media_url_ttl_secs: u64,
    pub cognitive: CognitiveConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Azure Cognitive Services credentials. Empty values route every call to its fallback.
#[derive(Debug, Clone, Default)]
pub struct CognitiveConfig {
    pub text_endpoint: String,
    pub text_key: String,
    pub vision_endpoint: String,
    pub vision_key: String,
    pub speech_region: String,
    pub speech_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            media_bucket: optional_env("MEDIA_BUCKET")
                .unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.to_string()),
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            media_url_ttl_secs: parse_media_url_ttl(
                optional_env("MEDIA_URL_TTL_SECS").as_deref(),
            )?,
            cognitive: CognitiveConfig {
                text_endpoint: optional_env("AZURE_TEXT_ENDPOINT").unwrap_or_default(),
                text_key: optional_env("AZURE_TEXT_KEY").unwrap_or_default(),
                vision_endpoint: optional_env("AZURE_VISION_ENDPOINT").unwrap_or_default(),
                vision_key: optional_env("AZURE_VISION_KEY").unwrap_or_default(),
                speech_region: optional_env("AZURE_SPEECH_REGION").unwrap_or_default(),
                speech_key: optional_env("AZURE_SPEECH_KEY").unwrap_or_default(),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_media_url_ttl(raw: Option<&str>) -> Result<u64> {
    let secs = raw
        .unwrap_or("3600")
        .trim()
        .parse::<u64>()
        .context("MEDIA_URL_TTL_SECS must be a number of seconds")?;
    if secs == 0 || secs > MAX_MEDIA_URL_TTL_SECS {
        anyhow::bail!(
            "MEDIA_URL_TTL_SECS must be between 1 and {MAX_MEDIA_URL_TTL_SECS} seconds, got {secs}"
        );
    }
    Ok(secs)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
