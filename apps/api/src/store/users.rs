use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{IdentityProfile, Submission, UpsertOutcome, UserRecord};

/// Persistent user records keyed by Clerk id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, AppError>;

    /// Find-or-create the user and overwrite their latest submission.
    async fn record_submission(
        &self,
        clerk_id: &str,
        submission: &Submission,
    ) -> Result<UpsertOutcome, AppError>;

    /// Find-or-create the user from webhook profile data.
    /// Absent incoming fields keep whatever the record already holds.
    async fn sync_identity(&self, profile: &IdentityProfile) -> Result<UpsertOutcome, AppError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn outcome(inserted: bool) -> UpsertOutcome {
    if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE clerk_id = $1")
            .bind(clerk_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn record_submission(
        &self,
        clerk_id: &str,
        submission: &Submission,
    ) -> Result<UpsertOutcome, AppError> {
        // xmax is 0 only on a freshly inserted row
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO users
                (id, clerk_id, resume_url, image_url, job_title, job_description, feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (clerk_id) DO UPDATE SET
                resume_url = EXCLUDED.resume_url,
                image_url = EXCLUDED.image_url,
                job_title = EXCLUDED.job_title,
                job_description = EXCLUDED.job_description,
                feedback = EXCLUDED.feedback,
                updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(clerk_id)
        .bind(&submission.resume_url)
        .bind(&submission.image_url)
        .bind(&submission.job_title)
        .bind(&submission.job_description)
        .bind(Json(&submission.feedback))
        .fetch_one(&self.pool)
        .await?;

        info!("Saved latest submission for user {clerk_id} (inserted={inserted})");
        Ok(outcome(inserted))
    }

    async fn sync_identity(&self, profile: &IdentityProfile) -> Result<UpsertOutcome, AppError> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO users
                (id, clerk_id, email, first_name, last_name, phone_number, profile_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (clerk_id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                last_name = COALESCE(EXCLUDED.last_name, users.last_name),
                phone_number = COALESCE(EXCLUDED.phone_number, users.phone_number),
                profile_image_url = COALESCE(EXCLUDED.profile_image_url, users.profile_image_url),
                updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.clerk_id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone_number)
        .bind(&profile.profile_image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(outcome(inserted))
    }
}
