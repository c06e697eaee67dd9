use serde::{Deserialize, Serialize};

use crate::models::feedback::Feedback;

/// One cached resume analysis, stored as JSON under `resume:<analysis id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub clerk_id: String,
    pub job_title: String,
    pub job_description: String,
    pub resume_url: String,
    pub image_url: String,
    pub feedback: Feedback,
}

/// Body of `GET /api/resume/resume-feedback/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetail {
    pub image_url: String,
    pub resume_url: String,
    pub feedback: Feedback,
}

impl From<CachedAnalysis> for AnalysisDetail {
    fn from(entry: CachedAnalysis) -> Self {
        AnalysisDetail {
            image_url: entry.image_url,
            resume_url: entry.resume_url,
            feedback: entry.feedback,
        }
    }
}

/// One element of `GET /api/resume/user-resumes`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub resume_id: String,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    pub job_title: Option<String>,
    pub feedback: Option<Feedback>,
}
