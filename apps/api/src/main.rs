mod auth;
mod clients;
mod config;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::RedisSessionVerifier;
use crate::clients::blob::S3BlobStore;
use crate::clients::feedback::AnthropicFeedbackGenerator;
use crate::clients::kv::RedisKvStore;
use crate::clients::rasterizer::PdfiumRasterizer;
use crate::clients::{BlobStore, KvStore};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::analyzer::Analyzer;
use crate::pipeline::status::StatusBoard;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis (records + sessions)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let records: Arc<dyn KvStore> = Arc::new(RedisKvStore::new(redis.clone()));
    let sessions = Arc::new(RedisSessionVerifier::new(redis));
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize rasteriser
    let rasterizer = Arc::new(PdfiumRasterizer::new(
        config.pdfium_lib_dir.clone(),
        config.raster_max_pixels,
    ));
    info!(
        "Rasteriser initialized (max {} px, pdfium from {})",
        config.raster_max_pixels,
        config.pdfium_lib_dir.as_deref().unwrap_or("system")
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_attempts)?;
    let feedback = Arc::new(AnthropicFeedbackGenerator::new(llm, blobs.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let analyzer = Arc::new(Analyzer::new(blobs, records.clone(), rasterizer, feedback));

    // Build app state
    let state = AppState {
        analyzer,
        records,
        sessions,
        status: StatusBoard::default(),
        max_upload_bytes: config.max_upload_bytes,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the web client's origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "ats-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
