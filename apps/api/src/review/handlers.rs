//! Axum route handlers for the resume API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisDetail, AnalysisSummary};
use crate::review::service::{
    analyze_resume, get_analysis, list_analyses, AnalysisCreated, ResumeUpload,
};
use crate::state::AppState;

const JOB_TITLE_FIELD: &str = "jobTitle";
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
const RESUME_FIELD: &str = "resume";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// POST /api/resume/analyze
///
/// Multipart form with `jobTitle`, `jobDescription` and a `resume` file.
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalysisCreated>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    let created = analyze_resume(&state, &user.clerk_id, upload).await?;
    Ok(Json(created))
}

/// GET /api/resume/resume-feedback/:id
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> Result<Json<AnalysisDetail>, AppError> {
    let detail = get_analysis(state.cache.as_ref(), &analysis_id).await?;
    Ok(Json(detail))
}

/// GET /api/resume/user-resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AnalysisSummary>>, AppError> {
    let resumes = list_analyses(state.cache.as_ref(), state.users.as_ref(), &user.clerk_id).await?;
    Ok(Json(resumes))
}

async fn read_upload(multipart: &mut Multipart) -> Result<ResumeUpload, AppError> {
    let mut job_title = None;
    let mut job_description = None;
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_TITLE_FIELD) => job_title = Some(field.text().await.map_err(malformed)?),
            Some(JOB_DESCRIPTION_FIELD) => {
                job_description = Some(field.text().await.map_err(malformed)?)
            }
            Some(RESUME_FIELD) => {
                let file_name = field.file_name().unwrap_or(RESUME_FIELD).to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                resume = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let job_title = required_text(job_title, JOB_TITLE_FIELD)?;
    let job_description = required_text(job_description, JOB_DESCRIPTION_FIELD)?;
    let (file_name, content_type, bytes) = resume
        .ok_or_else(|| AppError::Validation(format!("{RESUME_FIELD} file is required")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation(format!("{RESUME_FIELD} file is empty")));
    }

    Ok(ResumeUpload {
        job_title,
        job_description,
        file_name,
        content_type,
        bytes,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}
