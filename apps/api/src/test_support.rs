//! In-memory stand-ins for the external services, wired into a full `AppState`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::auth::webhook::WebhookVerifier;
use crate::auth::IdentityVerifier;
use crate::errors::AppError;
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::analysis::CachedAnalysis;
use crate::models::feedback::sample_feedback;
use crate::models::user::{IdentityProfile, Submission, UpsertOutcome, UserRecord};
use crate::rate_limit::RateLimiter;
use crate::review::reviewer::ResumeReviewer;
use crate::state::AppState;
use crate::store::cache::AnalysisCache;
use crate::store::files::{FileStorage, PreviewRule};
use crate::store::users::UserStore;

// base64("test-signing-key-for-webhooks")
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC1zaWduaW5nLWtleS1mb3Itd2ViaG9va3M=";

pub const STORAGE_BASE_URL: &str = "https://cdn.test/demo/upload";

/// Session tokens look like `tok_<clerk id>`.
pub fn session_token(clerk_id: &str) -> String {
    format!("tok_{clerk_id}")
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CachedAnalysis>>,
}

impl InMemoryCache {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn contains(&self, analysis_id: &str) -> bool {
        self.entries.lock().unwrap().contains_key(analysis_id)
    }

    /// Drops the entry as if its TTL had run out.
    pub fn expire(&self, analysis_id: &str) {
        self.entries.lock().unwrap().remove(analysis_id);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[async_trait]
impl AnalysisCache for InMemoryCache {
    async fn put(&self, analysis_id: &str, entry: &CachedAnalysis) -> Result<(), AppError> {
        self.entries
            .lock()
            .unwrap()
            .insert(analysis_id.to_string(), entry.clone());
        Ok(())
    }

    async fn get(&self, analysis_id: &str) -> Result<Option<CachedAnalysis>, AppError> {
        Ok(self.entries.lock().unwrap().get(analysis_id).cloned())
    }

    async fn scan_all(&self) -> Result<Vec<(String, CachedAnalysis)>, AppError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect())
    }
}

/// Mirrors the upsert rules of `PgUserStore`.
#[derive(Default)]
pub struct InMemoryUsers {
    records: Mutex<HashMap<String, UserRecord>>,
    submission_writes: AtomicUsize,
    identity_writes: AtomicUsize,
}

impl InMemoryUsers {
    pub fn get(&self, clerk_id: &str) -> Option<UserRecord> {
        self.records.lock().unwrap().get(clerk_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn submission_writes(&self) -> usize {
        self.submission_writes.load(Ordering::SeqCst)
    }

    pub fn identity_writes(&self) -> usize {
        self.identity_writes.load(Ordering::SeqCst)
    }

    /// A user known from the webhook who never submitted a resume.
    pub fn insert_profile_only(&self, clerk_id: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(clerk_id.to_string(), blank_user(clerk_id));
    }

    fn upsert(&self, clerk_id: &str, apply: impl FnOnce(&mut UserRecord)) -> UpsertOutcome {
        let mut records = self.records.lock().unwrap();
        let outcome = if records.contains_key(clerk_id) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        let record = records
            .entry(clerk_id.to_string())
            .or_insert_with(|| blank_user(clerk_id));
        apply(record);
        record.updated_at = Utc::now();
        outcome
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.get(clerk_id))
    }

    async fn record_submission(
        &self,
        clerk_id: &str,
        submission: &Submission,
    ) -> Result<UpsertOutcome, AppError> {
        self.submission_writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.upsert(clerk_id, |user| {
            user.resume_url = Some(submission.resume_url.clone());
            user.image_url = Some(submission.image_url.clone());
            user.job_title = Some(submission.job_title.clone());
            user.job_description = Some(submission.job_description.clone());
            user.feedback = Some(Json(submission.feedback.clone()));
        }))
    }

    async fn sync_identity(&self, profile: &IdentityProfile) -> Result<UpsertOutcome, AppError> {
        self.identity_writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.upsert(&profile.clerk_id, |user| {
            keep_or_replace(&mut user.email, &profile.email);
            keep_or_replace(&mut user.first_name, &profile.first_name);
            keep_or_replace(&mut user.last_name, &profile.last_name);
            keep_or_replace(&mut user.phone_number, &profile.phone_number);
            keep_or_replace(&mut user.profile_image_url, &profile.profile_image_url);
        }))
    }
}

fn blank_user(clerk_id: &str) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: Uuid::new_v4(),
        clerk_id: clerk_id.to_string(),
        email: None,
        first_name: None,
        last_name: None,
        phone_number: None,
        profile_image_url: None,
        roles: Vec::new(),
        resume_url: None,
        image_url: None,
        job_title: None,
        job_description: None,
        feedback: None,
        created_at: now,
        updated_at: now,
    }
}

fn keep_or_replace(current: &mut Option<String>, incoming: &Option<String>) {
    if incoming.is_some() {
        current.clone_from(incoming);
    }
}

pub struct FakeStorage {
    base_url: String,
    preview: PreviewRule,
    uploads: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self::serving_from(STORAGE_BASE_URL, PreviewRule::CdnTransform)
    }
}

impl FakeStorage {
    pub fn serving_from(base_url: &str, preview: PreviewRule) -> Self {
        Self {
            base_url: base_url.to_string(),
            preview,
            uploads: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Keys of every stored object, in upload order.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn fail_uploads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStorage for FakeStorage {
    async fn upload(&self, key: &str, _body: Bytes, _content_type: &str) -> Result<String, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("{}/{key}", self.base_url))
    }

    fn preview_url(&self, key: &str, resume_url: &str) -> String {
        self.preview.preview_url(key, resume_url)
    }
}

/// Answers every prompt with the same text and remembers the prompts it saw.
pub struct CannedModel {
    response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn returning_feedback() -> Self {
        Self::new(&serde_json::to_string(&sample_feedback()).unwrap())
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().ok_or(LlmError::EmptyContent)
    }
}

pub struct StaticIdentity;

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<String, AppError> {
        token
            .strip_prefix("tok_")
            .filter(|id| !id.is_empty())
            .map(String::from)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session token".to_string()))
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub cache: Arc<InMemoryCache>,
    pub users: Arc<InMemoryUsers>,
    pub storage: Arc<FakeStorage>,
    pub model: Arc<CannedModel>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_model(CannedModel::returning_feedback())
    }

    pub fn with_model_response(response: &str) -> Self {
        Self::with_model(CannedModel::new(response))
    }

    pub fn with_storage(storage: FakeStorage) -> Self {
        Self::build(CannedModel::returning_feedback(), storage)
    }

    fn with_model(model: CannedModel) -> Self {
        Self::build(model, FakeStorage::default())
    }

    fn build(model: CannedModel, storage: FakeStorage) -> Self {
        let cache = Arc::new(InMemoryCache::default());
        let users = Arc::new(InMemoryUsers::default());
        let storage = Arc::new(storage);
        let model = Arc::new(model);

        let state = AppState {
            users: users.clone(),
            cache: cache.clone(),
            storage: storage.clone(),
            reviewer: Arc::new(ResumeReviewer::new(model.clone())),
            identity: Arc::new(StaticIdentity),
            webhook: Some(Arc::new(WebhookVerifier::new(WEBHOOK_SECRET).unwrap())),
            root_limiter: Arc::new(RateLimiter::per_minute(100)),
        };

        Self {
            state,
            cache,
            users,
            storage,
            model,
        }
    }
}
