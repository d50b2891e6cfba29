mod cognitive;
mod config;
mod db;
mod enrichment;
mod entries;
mod errors;
mod insights;
mod media;
mod models;
mod prompts;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cognitive::AzureCognitive;
use crate::config::Config;
use crate::db::create_pool;
use crate::media::MediaStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Timeline API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize blob storage
    let s3 = build_s3_client(&config).await;
    let media = MediaStore::new(
        s3,
        &config.s3_endpoint,
        config.media_bucket.clone(),
        Duration::from_secs(config.media_url_ttl_secs),
    )?;
    info!("Media store initialized (container: {})", media.bucket());

    // Initialize Cognitive Services client
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let cognitive = Arc::new(AzureCognitive::new(http.clone(), config.cognitive.clone()));
    if config.cognitive.text_key.is_empty() {
        info!("Text analytics not configured; sentiment and categories use defaults");
    }

    let state = AppState {
        db,
        media,
        cognitive,
        http,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs a path-style S3 client for MinIO (local) or any S3-compatible store.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "timeline-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
