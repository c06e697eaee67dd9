use anyhow::{bail, Context, Result};

use crate::store::files::{PreviewRule, KEY_PLACEHOLDER};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Public base URL that uploaded objects are served from (CDN or bucket URL).
    pub storage_public_url: String,
    /// Derived from `STORAGE_PUBLIC_URL` and the optional `STORAGE_PREVIEW_URL` template.
    pub preview_rule: PreviewRule,
    pub anthropic_api_key: String,
    pub clerk_secret_key: String,
    /// Only checked when a webhook arrives; `/clerk` answers 500 while unset.
    pub clerk_webhook_secret: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_public_url = require_env("STORAGE_PUBLIC_URL")?;
        let preview_rule =
            resolve_preview_rule(&storage_public_url, optional_env("STORAGE_PREVIEW_URL"))?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            storage_public_url,
            preview_rule,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            clerk_secret_key: require_env("CLERK_SECRET_KEY")?,
            clerk_webhook_secret: optional_env("CLERK_WEBHOOK_SECRET"),
            allowed_origins: parse_origins(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            max_upload_bytes: match optional_env("MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
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

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Picks how preview images are addressed.
///
/// A `STORAGE_PREVIEW_URL` template must contain `{key}`. Without one, the public
/// base must be an image CDN path with an `/upload` segment, otherwise every
/// preview URL would just be the document URL.
fn resolve_preview_rule(public_base: &str, template: Option<String>) -> Result<PreviewRule> {
    match template {
        Some(template) if template.contains(KEY_PLACEHOLDER) => Ok(PreviewRule::Template(template)),
        Some(_) => bail!("STORAGE_PREVIEW_URL must contain the {KEY_PLACEHOLDER} placeholder"),
        None if format!("{}/", public_base.trim_end_matches('/')).contains("/upload/") => {
            Ok(PreviewRule::CdnTransform)
        }
        None => bail!(
            "STORAGE_PUBLIC_URL has no /upload/ segment; set STORAGE_PREVIEW_URL to a preview template containing {KEY_PLACEHOLDER}"
        ),
    }
}

/// Splits the comma-separated `ALLOWED_ORIGINS` value. Empty input means no origins.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
