use std::sync::Arc;

use crate::auth::webhook::WebhookVerifier;
use crate::auth::IdentityVerifier;
use crate::rate_limit::RateLimiter;
use crate::review::reviewer::ResumeReviewer;
use crate::store::cache::AnalysisCache;
use crate::store::files::FileStorage;
use crate::store::users::UserStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every connection and client is built once in `main`; handlers only borrow them.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub cache: Arc<dyn AnalysisCache>,
    pub storage: Arc<dyn FileStorage>,
    pub reviewer: Arc<ResumeReviewer>,
    pub identity: Arc<dyn IdentityVerifier>,
    /// `None` when no webhook secret is configured; `/clerk` then answers 500.
    pub webhook: Option<Arc<WebhookVerifier>>,
    /// Throttles the welcome endpoint only.
    pub root_limiter: Arc<RateLimiter>,
}
