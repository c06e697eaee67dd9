pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::rate_limit::limit_by_client_ip;
use crate::review::handlers as review;
use crate::state::AppState;
use crate::webhooks::handlers as webhooks;

pub fn build_router(state: AppState) -> Router {
    let welcome = Router::new()
        .route("/", get(health::welcome_handler))
        .layer(from_fn_with_state(state.clone(), limit_by_client_ip));

    Router::new()
        .merge(welcome)
        .route("/health", get(health::health_handler))
        // Identity provider webhook
        .route("/clerk", post(webhooks::handle_clerk_webhook))
        // Resume API
        .route("/api/resume/analyze", post(review::handle_analyze))
        .route(
            "/api/resume/resume-feedback/:id",
            get(review::handle_get_feedback),
        )
        .route("/api/resume/user-resumes", get(review::handle_list_resumes))
        .with_state(state)
}
