//! Post-interview feedback report.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::interview::context::InterviewContext;
use crate::interview::prompts::feedback_prompt;
use crate::llm_client::{extract_json_object, ChatMessage, ChatProvider, ChatRequest};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackCategory {
    pub name: String,
    pub score: u32,
    pub feedback: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackReport {
    pub overall_score: u32,
    pub categories: Vec<FeedbackCategory>,
    pub key_strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Scores a finished transcript. The first `{...}` span in the reply is taken as the report.
pub async fn generate_feedback(
    context: &InterviewContext,
    history: &[ChatMessage],
    provider: &dyn ChatProvider,
) -> Result<FeedbackReport, AppError> {
    let request = ChatRequest::new(vec![ChatMessage::user(feedback_prompt(context, history))]);
    let raw = provider
        .complete(&request)
        .await
        .map_err(|e| AppError::from_llm("Feedback generation failed", e))?;

    let Some(object) = extract_json_object(&raw) else {
        warn!("Feedback reply contained no JSON object");
        return Err(AppError::ParseFailure {
            message: "Feedback reply contained no JSON object".to_string(),
            raw,
        });
    };

    serde_json::from_str(object).map_err(|e| AppError::ParseFailure {
        message: format!("Feedback reply was not a valid report: {e}"),
        raw: raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedProvider;

    fn transcript() -> Vec<ChatMessage> {
        vec![
            ChatMessage::assistant("Tell me about yourself."),
            ChatMessage::user("I build payment systems in Rust."),
        ]
    }

    #[tokio::test]
    async fn test_report_extracted_from_prose() {
        let provider = ScriptedProvider::replying(
            r#"Here is the evaluation:
{"overallScore": 82, "categories": [{"name": "Communication Skills", "score": 80, "feedback": ["Clear"], "strengths": [], "improvements": ["Slow down"]}], "keyStrengths": ["Domain depth"], "areasForImprovement": ["Brevity"], "recommendations": ["Practice STAR"]}
Good luck!"#,
        );

        let report = generate_feedback(&InterviewContext::default(), &transcript(), &provider)
            .await
            .unwrap();
        assert_eq!(report.overall_score, 82);
        assert_eq!(report.categories[0].improvements, vec!["Slow down"]);
        assert_eq!(report.recommendations, vec!["Practice STAR"]);

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("Candidate: I build payment systems in Rust."));
    }

    #[tokio::test]
    async fn test_reply_without_object_is_a_parse_failure() {
        let provider = ScriptedProvider::replying("The candidate did well overall.");
        let err = generate_feedback(&InterviewContext::default(), &transcript(), &provider)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParseFailure { raw, .. } if raw.contains("did well")));
    }
}
