//! Clerk webhook payloads.
//!
//! Only the fields the user record mirrors are read, and every one of them is
//! optional so partial payloads never fail deserialization.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::user::IdentityProfile;

pub const USER_CREATED: &str = "user.created";

/// Envelope shared by every Clerk event. `data` stays untyped until the
/// event type is known to be one we handle.
#[derive(Debug, Deserialize)]
pub struct ClerkEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClerkUser {
    id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_image_url: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    email_addresses: Option<Vec<EmailAddress>>,
    primary_phone_number_id: Option<String>,
    phone_numbers: Option<Vec<PhoneNumber>>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: Option<String>,
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhoneNumber {
    id: Option<String>,
    phone_number: Option<String>,
}

impl ClerkEvent {
    pub fn is_user_created(&self) -> bool {
        self.event_type == USER_CREATED
    }

    /// Profile carried by a user event. A missing user id is a validation error.
    pub fn identity_profile(&self) -> Result<IdentityProfile, AppError> {
        let user: ClerkUser = serde_json::from_value(self.data.clone())
            .map_err(|e| AppError::Validation(format!("Malformed user payload: {e}")))?;

        let clerk_id = user
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Webhook payload has no user id".to_string()))?;

        let email = primary_or_first(
            user.email_addresses.unwrap_or_default(),
            user.primary_email_address_id.as_deref(),
            |e| (e.id, e.email_address),
        );
        let phone_number = primary_or_first(
            user.phone_numbers.unwrap_or_default(),
            user.primary_phone_number_id.as_deref(),
            |p| (p.id, p.phone_number),
        );

        Ok(IdentityProfile {
            clerk_id,
            email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number,
            profile_image_url: user.profile_image_url.or(user.image_url),
        })
    }
}

/// Value of the entry whose id is `primary_id`, else of the first entry.
fn primary_or_first<T>(
    items: Vec<T>,
    primary_id: Option<&str>,
    split: impl Fn(T) -> (Option<String>, Option<String>),
) -> Option<String> {
    let pairs: Vec<_> = items.into_iter().map(split).collect();
    let primary = primary_id.and_then(|wanted| {
        pairs
            .iter()
            .find(|(id, _)| id.as_deref() == Some(wanted))
            .and_then(|(_, value)| value.clone())
    });
    primary.or_else(|| pairs.into_iter().next().and_then(|(_, value)| value))
}
