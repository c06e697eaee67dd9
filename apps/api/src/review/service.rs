//! The analysis pipeline and the two read paths over its results.

use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisDetail, AnalysisSummary, CachedAnalysis};
use crate::models::user::Submission;
use crate::state::AppState;
use crate::store::cache::{cache_key, AnalysisCache};
use crate::store::files::resume_object_key;
use crate::store::users::UserStore;

/// A validated `POST /api/resume/analyze` request.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub job_title: String,
    pub job_description: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisCreated {
    pub id: String,
    pub resume_url: String,
    pub image_url: String,
    pub message: String,
}

/// Runs one analysis end to end: review → upload → cache → user record.
///
/// Stages run in order and the first failure aborts the request. Earlier side
/// effects are not undone, and every call creates a fresh analysis id and upload.
pub async fn analyze_resume(
    state: &AppState,
    clerk_id: &str,
    upload: ResumeUpload,
) -> Result<AnalysisCreated, AppError> {
    info!(
        "Start resume analysis for user {clerk_id}: {} bytes ({})",
        upload.bytes.len(),
        upload.content_type
    );

    let feedback = state
        .reviewer
        .review_file(
            upload.bytes.clone(),
            &upload.content_type,
            &upload.job_title,
            &upload.job_description,
        )
        .await?;

    let object_key = resume_object_key(&upload.file_name);
    let resume_url = state
        .storage
        .upload(&object_key, upload.bytes, &upload.content_type)
        .await?;
    let image_url = state.storage.preview_url(&object_key, &resume_url);

    let analysis_id = Uuid::new_v4().to_string();
    let entry = CachedAnalysis {
        clerk_id: clerk_id.to_string(),
        job_title: upload.job_title,
        job_description: upload.job_description,
        resume_url,
        image_url,
        feedback,
    };
    state.cache.put(&analysis_id, &entry).await?;
    info!("Cached analysis under {}", cache_key(&analysis_id));

    let CachedAnalysis {
        job_title,
        job_description,
        resume_url,
        image_url,
        feedback,
        ..
    } = entry;
    let submission = Submission {
        resume_url: resume_url.clone(),
        image_url: image_url.clone(),
        job_title,
        job_description,
        feedback,
    };
    let outcome = state.users.record_submission(clerk_id, &submission).await?;
    info!("User {clerk_id} record {outcome:?} with analysis {analysis_id}");

    Ok(AnalysisCreated {
        id: analysis_id,
        resume_url,
        image_url,
        message: "Resume analyzed, uploaded, cached, and saved.".to_string(),
    })
}

/// Cache-only lookup; there is no fallback to the user store on this path.
pub async fn get_analysis(
    cache: &dyn AnalysisCache,
    analysis_id: &str,
) -> Result<AnalysisDetail, AppError> {
    cache
        .get(analysis_id)
        .await?
        .map(AnalysisDetail::from)
        .ok_or_else(|| AppError::NotFound("Resume not found or expired.".to_string()))
}

/// All cached analyses belonging to `clerk_id`.
///
/// Scans every cached entry. When none belong to the caller, the latest
/// submission on their user record is returned instead, if there is one.
pub async fn list_analyses(
    cache: &dyn AnalysisCache,
    users: &dyn UserStore,
    clerk_id: &str,
) -> Result<Vec<AnalysisSummary>, AppError> {
    let resumes: Vec<AnalysisSummary> = cache
        .scan_all()
        .await?
        .into_iter()
        .filter(|(_, entry)| entry.clerk_id == clerk_id)
        .map(|(analysis_id, entry)| AnalysisSummary {
            resume_id: analysis_id,
            resume_url: Some(entry.resume_url),
            image_url: Some(entry.image_url),
            job_title: Some(entry.job_title),
            feedback: Some(entry.feedback),
        })
        .collect();

    if !resumes.is_empty() {
        return Ok(resumes);
    }

    let fallback = users
        .find_by_clerk_id(clerk_id)
        .await?
        .filter(|user| user.has_submission())
        .map(|user| AnalysisSummary {
            resume_id: user.id.to_string(),
            resume_url: user.resume_url,
            image_url: user.image_url,
            job_title: user.job_title,
            feedback: user.feedback.map(|f| f.0),
        });

    Ok(fallback.into_iter().collect())
}
