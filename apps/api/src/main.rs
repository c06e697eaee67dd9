mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod rate_limit;
mod review;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;
mod webhooks;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::webhook::WebhookVerifier;
use crate::auth::ClerkVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::rate_limit::RateLimiter;
use crate::review::reviewer::ResumeReviewer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::cache::RedisAnalysisCache;
use crate::store::files::S3Storage;
use crate::store::users::PgUserStore;

/// Requests per client per minute on the welcome route.
const WELCOME_RATE_LIMIT: u32 = 100;

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

    info!("Starting Resume Reviewer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let users = Arc::new(PgUserStore::new(db));

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = Arc::new(
        RedisAnalysisCache::connect(&redis)
            .await
            .context("Failed to connect to Redis")?,
    );
    info!("Redis connection established");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = Arc::new(S3Storage::new(
        s3,
        config.s3_bucket.clone(),
        config.storage_public_url.clone(),
        config.preview_rule.clone(),
    ));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let reviewer = Arc::new(ResumeReviewer::new(Arc::new(llm)));

    // Initialize identity checks
    let identity = Arc::new(ClerkVerifier::new(&config.clerk_secret_key));
    let webhook = config
        .clerk_webhook_secret
        .as_deref()
        .map(WebhookVerifier::new)
        .transpose()
        .context("CLERK_WEBHOOK_SECRET is not a valid signing secret")?
        .map(Arc::new);
    if webhook.is_none() {
        warn!("CLERK_WEBHOOK_SECRET is not set; /clerk will reject every delivery");
    }

    // Build app state
    let state = AppState {
        users,
        cache,
        storage,
        reviewer,
        identity,
        webhook,
        root_limiter: Arc::new(RateLimiter::per_minute(WELCOME_RATE_LIMIT)),
    };

    // Build router
    let app = build_router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config.allowed_origins)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Credentialed CORS for the configured origins only. No origins means no cross-origin access.
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "reviewer-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
