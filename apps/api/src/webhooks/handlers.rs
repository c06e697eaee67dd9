use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::UpsertOutcome;
use crate::state::AppState;
use crate::webhooks::clerk::ClerkEvent;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// POST /clerk
///
/// The signature is checked against the raw body before it is parsed.
/// Only `user.created` events touch the database; anything else is acknowledged.
pub async fn handle_clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let verifier = state
        .webhook
        .as_ref()
        .ok_or_else(|| AppError::Config("Webhook secret not configured".to_string()))?;

    info!("Webhook received: {} bytes", body.len());

    verifier.verify(&headers, &body).map_err(|e| {
        warn!("Webhook rejected: {e}");
        AppError::from(e)
    })?;

    let event: ClerkEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

    if !event.is_user_created() {
        info!("Webhook ignored: {} is not handled", event.event_type);
        return Ok(Json(WebhookAck { status: "ignored" }));
    }

    let profile = event.identity_profile()?;
    match state.users.sync_identity(&profile).await? {
        UpsertOutcome::Inserted => info!("Inserted new user {}", profile.clerk_id),
        UpsertOutcome::Updated => info!("Updated existing user {}", profile.clerk_id),
    }

    Ok(Json(WebhookAck { status: "success" }))
}
