// Prompt templates for resume review.
// Placeholders are replaced literally by `build_prompt`.

pub const JOB_TITLE_PLACEHOLDER: &str = "${jobTitle}";
pub const JOB_DESCRIPTION_PLACEHOLDER: &str = "${jobDescription}";
pub const RESPONSE_FORMAT_PLACEHOLDER: &str = "${AIResponseFormat}";

pub const RESUME_PROMPT: &str = r#"You are an expert in Applicant Tracking Systems (ATS) and professional resume review.
Give a detailed, objective evaluation of the resume below against the target job.

Steps:
1. Score every category from 0 to 100. "overallScore" is the average of the five
   category scores, rounded to the nearest whole number.
2. Check the resume against the keywords, requirements and responsibilities in the
   job description and use that to score "ATS".
3. Give specific, actionable tips for every category. Use "good" for strengths and
   "improve" for weaknesses. Tips must refer to this resume and this job, never generic advice.
4. Recommend 2-5 job titles that fit the resume and job description, and 3-6
   responsibilities the candidate could add or emphasise to match the job better.

Job Title: ${jobTitle}
Job Description: ${jobDescription}

Return only a JSON object that strictly matches this schema:
${AIResponseFormat}
No extra text, no Markdown, no backticks. Only valid JSON."#;

pub const RESPONSE_FORMAT: &str = r#"{
  "overallScore": 0,
  "ATS": {
    "score": 0,
    "tips": [
      { "type": "good", "tip": "Keyword-rich formatting" },
      { "type": "improve", "tip": "Optimize for ATS parsing" }
    ]
  },
  "toneAndStyle": {
    "score": 0,
    "tips": [
      { "type": "good", "tip": "Professional yet approachable", "explanation": "The tone balances formal and friendly language." }
    ]
  },
  "content": {
    "score": 0,
    "tips": [
      { "type": "improve", "tip": "Add measurable achievements", "explanation": "Concrete metrics such as revenue or user numbers strengthen impact." }
    ]
  },
  "structure": {
    "score": 0,
    "tips": [
      { "type": "improve", "tip": "Reorder sections", "explanation": "Put the most relevant experience first." }
    ]
  },
  "skills": {
    "score": 0,
    "tips": [
      { "type": "good", "tip": "Relevant technical skills", "explanation": "The listed skills match the target role." }
    ]
  },
  "recommendation": {
    "roles": ["Site Reliability Engineer", "Platform Engineer"],
    "responsibilities": [
      "Design and maintain CI/CD pipelines.",
      "Automate infrastructure provisioning with Terraform."
    ]
  }
}"#;

/// Fills the review template. The response format is substituted before the
/// caller-supplied job fields.
pub fn build_prompt(job_title: &str, job_description: &str) -> String {
    RESUME_PROMPT
        .replace(RESPONSE_FORMAT_PLACEHOLDER, RESPONSE_FORMAT)
        .replace(JOB_TITLE_PLACEHOLDER, job_title)
        .replace(JOB_DESCRIPTION_PLACEHOLDER, job_description)
}
