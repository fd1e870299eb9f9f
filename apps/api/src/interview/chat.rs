//! Chat turns: request assembly and the one-shot round trip.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::interview::context::{CandidateProfile, InterviewContext, InterviewType, JobData};
use crate::interview::phase::InterviewPhase;
use crate::interview::prompts::{interview_system_prompt, streaming_system_prompt};
use crate::llm_client::{ChatMessage, ChatProvider, ChatRequest, LlmError};

/// Output budget for a one-shot interviewer reply.
const CHAT_MAX_TOKENS: u32 = 200;
/// Output budget for a streamed interviewer reply.
const STREAM_MAX_TOKENS: u32 = 300;

/// Reply to a one-shot chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub phase: InterviewPhase,
    pub timestamp: DateTime<Utc>,
}

/// System prompt from context + phase, then the prior turns, then the new user input.
pub fn build_chat_request(
    context: &InterviewContext,
    phase: InterviewPhase,
    history: Vec<ChatMessage>,
    user_message: &str,
) -> ChatRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(interview_system_prompt(context, phase)));
    messages.extend(history);
    messages.push(ChatMessage::user(user_message));
    ChatRequest::new(messages).max_tokens(CHAT_MAX_TOKENS)
}

/// Same layout as `build_chat_request`, with the interview-type system prompt.
pub fn build_stream_request(
    interview_type: InterviewType,
    job: &JobData,
    profile: &CandidateProfile,
    history: Vec<ChatMessage>,
    user_message: &str,
) -> ChatRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(streaming_system_prompt(
        interview_type,
        job,
        profile,
    )));
    messages.extend(history);
    messages.push(ChatMessage::user(user_message));
    ChatRequest::new(messages).max_tokens(STREAM_MAX_TOKENS)
}

/// Sends one turn and wraps the reply with its phase and a server timestamp.
pub async fn run_chat_turn(
    provider: &dyn ChatProvider,
    request: &ChatRequest,
    phase: InterviewPhase,
) -> Result<ChatReply, LlmError> {
    info!("Sending {phase} turn to {}", provider.name());
    let message = provider.complete(request).await?;
    Ok(ChatReply {
        message,
        phase,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::llm_client::ChatRole;

    #[test]
    fn test_chat_request_layout() {
        let context = InterviewContext {
            job_title: "Backend Engineer".to_string(),
            ..Default::default()
        };
        let history = vec![
            ChatMessage::assistant("Welcome! Introduce yourself."),
            ChatMessage::user("I am Mina."),
        ];

        let request = build_chat_request(&context, InterviewPhase::Intro, history, "What next?");
        let roles: Vec<ChatRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::User
            ]
        );
        assert_eq!(request.messages.last().unwrap().content, "What next?");
        assert_eq!(request.max_tokens, Some(200));
    }

    #[test]
    fn test_stream_request_budget() {
        let request = build_stream_request(
            InterviewType::Personality,
            &JobData::default(),
            &CandidateProfile::default(),
            vec![],
            "Hello",
        );
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.max_tokens, Some(300));
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_run_chat_turn_echoes_phase() {
        let provider = ScriptedProvider::replying("Tell me about a project you led.");
        let request = build_chat_request(
            &InterviewContext::default(),
            InterviewPhase::Behavioral,
            vec![],
            "Sure",
        );

        let reply = run_chat_turn(&provider, &request, InterviewPhase::Behavioral)
            .await
            .unwrap();
        assert_eq!(reply.message, "Tell me about a project you led.");
        assert_eq!(reply.phase, InterviewPhase::Behavioral);
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_run_chat_turn_surfaces_upstream_failure() {
        let provider = ScriptedProvider::failing("rate limited");
        let request =
            build_chat_request(&InterviewContext::default(), InterviewPhase::Intro, vec![], "Hi");

        let err = run_chat_turn(&provider, &request, InterviewPhase::Intro)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        // No retry.
        assert_eq!(provider.requests().len(), 1);
    }
}
