//! Interview guide: a structured preparation plan generated for one job posting.

use serde::{Deserialize, Serialize};

use crate::catalog::JobPosting;
use crate::errors::AppError;
use crate::interview::prompts::{guide_system_prompt, guide_user_prompt};
use crate::llm_client::{complete_json, ChatMessage, ChatProvider, ChatRequest};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineStep {
    pub phase: String,
    pub focus: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PracticeQuestion {
    pub question: String,
    pub why_it_matters: String,
    pub how_to_answer: String,
}

/// Full guide as returned to the client under `{guide}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewGuide {
    pub job_overview: String,
    pub company_insight: String,
    pub key_competencies: Vec<String>,
    pub preparation_timeline: Vec<TimelineStep>,
    pub practice_questions: Vec<PracticeQuestion>,
    pub bonus_tips: Vec<String>,
}

/// Asks the provider for a guide and parses the reply.
/// A reply that is not JSON after fence stripping is a `ParseFailure` with the raw text.
pub async fn generate_guide(
    job: &JobPosting,
    provider: &dyn ChatProvider,
) -> Result<InterviewGuide, AppError> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(guide_system_prompt()),
        ChatMessage::user(guide_user_prompt(job)),
    ]);
    complete_json::<InterviewGuide>(provider, &request)
        .await
        .map_err(|e| AppError::from_llm("Guide generation failed", e))
}
