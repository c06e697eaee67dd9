use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LanguageModel;
use crate::models::feedback::Feedback;
use crate::review::extract::extract_text;
use crate::review::parse::{parse_feedback, preview};
use crate::review::prompts::build_prompt;

/// Turns a resume file and a target job into structured feedback.
pub struct ResumeReviewer {
    model: Arc<dyn LanguageModel>,
}

impl ResumeReviewer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Extracts the resume text, then asks the model to review it.
    pub async fn review_file(
        &self,
        file: Bytes,
        content_type: &str,
        job_title: &str,
        job_description: &str,
    ) -> Result<Feedback, AppError> {
        let resume_text = extract_text(file, content_type).await?;
        self.review_text(&resume_text, job_title, job_description)
            .await
    }

    pub async fn review_text(
        &self,
        resume_text: &str,
        job_title: &str,
        job_description: &str,
    ) -> Result<Feedback, AppError> {
        let prompt = build_prompt(job_title, job_description);
        let content = format!("{prompt}\n\nResume:\n{resume_text}");

        let raw = self
            .model
            .complete(&content, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("LLM generation failed: {e}")))?;

        info!(
            "Received LLM response (first 200 chars): {}",
            preview(&raw, 200)
        );

        parse_feedback(&raw)
    }
}
