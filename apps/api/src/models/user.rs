use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::feedback::Feedback;

/// A user mirrored from Clerk, plus their most recent resume submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub clerk_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub roles: Vec<String>,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub feedback: Option<Json<Feedback>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// True once the user has analysed at least one resume.
    pub fn has_submission(&self) -> bool {
        self.resume_url.is_some()
    }
}

/// Profile fields carried by an identity-provider webhook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityProfile {
    pub clerk_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
}

/// The latest analysis written onto a user record.
#[derive(Debug, Clone)]
pub struct Submission {
    pub resume_url: String,
    pub image_url: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
