use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory containing the pdfium shared library. System library when unset.
    pub pdfium_lib_dir: Option<String>,
    /// Longest edge, in pixels, of the rendered first-page image.
    pub raster_max_pixels: u32,
    /// Largest accepted résumé upload. Matches the upload widget's 20 MiB cap.
    pub max_upload_bytes: usize,
    /// Attempts per feedback call. 1 means no automatic retry.
    pub llm_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            pdfium_lib_dir: std::env::var("PDFIUM_LIB_DIR").ok(),
            raster_max_pixels: pixel_cap("RASTER_MAX_PIXELS", parse_env("RASTER_MAX_PIXELS", 2000)?)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>()))
}

/// pdfium takes render sizes as `i32`, and a zero edge renders nothing.
fn pixel_cap(key: &str, value: u32) -> Result<u32> {
    if value == 0 || value > i32::MAX as u32 {
        anyhow::bail!("{key} must be between 1 and {}, got {value}", i32::MAX);
    }
    Ok(value)
}
