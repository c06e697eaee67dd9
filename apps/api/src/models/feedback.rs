//! Structured resume feedback produced by the model.
//!
//! Field names follow the JSON schema the model is asked to fill in, so the
//! same shape is stored in the cache, in the user record and returned to clients.

use serde::{Deserialize, Serialize};

/// Whether a tip praises a strength or points at something to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub score: f64,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "overallScore")]
    pub overall_score: f64,
    #[serde(rename = "ATS")]
    pub ats: Section,
    #[serde(rename = "toneAndStyle")]
    pub tone_and_style: Section,
    pub content: Section,
    pub structure: Section,
    pub skills: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl Feedback {
    /// Named sections in the order they appear in the response schema.
    pub fn sections(&self) -> [(&'static str, &Section); 5] {
        [
            ("ATS", &self.ats),
            ("toneAndStyle", &self.tone_and_style),
            ("content", &self.content),
            ("structure", &self.structure),
            ("skills", &self.skills),
        ]
    }

    /// Checks every score is a finite number between 0 and 100.
    pub fn validate(&self) -> Result<(), String> {
        check_score("overallScore", self.overall_score)?;
        for (name, section) in self.sections() {
            check_score(name, section.score)?;
            if section.tips.iter().any(|t| t.tip.trim().is_empty()) {
                return Err(format!("{name} contains an empty tip"));
            }
        }
        Ok(())
    }
}

fn check_score(name: &str, score: f64) -> Result<(), String> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(format!("{name} score {score} is outside 0-100"))
    }
}

#[cfg(test)]
pub(crate) fn sample_feedback() -> Feedback {
    let section = |score: f64, kind: TipKind, tip: &str| Section {
        score,
        tips: vec![Tip {
            kind,
            tip: tip.to_string(),
            explanation: None,
        }],
    };
    Feedback {
        overall_score: 74.0,
        ats: section(80.0, TipKind::Good, "Keyword-rich formatting"),
        tone_and_style: section(70.0, TipKind::Good, "Professional tone"),
        content: section(65.0, TipKind::Improve, "Add metrics"),
        structure: section(75.0, TipKind::Improve, "Reorder sections"),
        skills: section(80.0, TipKind::Good, "Relevant skills"),
        recommendation: Some(Recommendation {
            roles: vec!["Backend Engineer".to_string()],
            responsibilities: vec!["Own the deployment pipeline".to_string()],
        }),
    }
}
