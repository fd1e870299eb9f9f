use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Json,
};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::chat::{build_chat_request, build_stream_request, run_chat_turn, ChatReply};
use crate::interview::context::{
    CandidateProfile, ConversationTurn, HistoryTurn, InterviewContext, InterviewType, JobData,
};
use crate::interview::feedback::{generate_feedback, FeedbackReport};
use crate::interview::guide::{generate_guide, InterviewGuide};
use crate::interview::phase::InterviewPhase;
use crate::interview::relay::{open_token_stream, relay_stream, sse_response};
use crate::llm_client::ChatMessage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub context: InterviewContext,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub phase: InterviewPhase,
    pub user_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTurnRequest {
    #[serde(default)]
    pub interview_type: InterviewType,
    #[serde(default)]
    pub job_data: JobData,
    #[serde(default)]
    pub user_profile: CandidateProfile,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    pub user_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRequest {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuideResponse {
    pub guide: InterviewGuide,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub context: InterviewContext,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/interview/chat
///
/// One-shot interviewer reply from Gemini for the given phase.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatTurnRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let provider = state.gemini()?;

    let history: Vec<ChatMessage> = request.history.iter().map(ChatMessage::from).collect();
    let chat_request =
        build_chat_request(&request.context, request.phase, history, &request.user_message);

    let reply = run_chat_turn(provider.as_ref(), &chat_request, request.phase)
        .await
        .map_err(|e| AppError::from_llm("Failed to generate response", e))?;
    Ok(Json(reply))
}

/// POST /api/interview/openai-chat
///
/// Streams the interviewer reply as SSE: `{token}` frames, then `{done, timestamp}` or one `{error}`.
pub async fn handle_openai_chat(
    State(state): State<AppState>,
    Json(request): Json<StreamTurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let provider = state.openai()?;

    let history: Vec<ChatMessage> = request
        .conversation_history
        .iter()
        .map(ChatMessage::from)
        .collect();
    let chat_request = build_stream_request(
        request.interview_type,
        &request.job_data,
        &request.user_profile,
        history,
        &request.user_message,
    );

    info!("Streaming {:?} interview turn", request.interview_type);
    let tokens = open_token_stream(provider.as_ref(), &chat_request).await;
    Ok(sse_response(relay_stream(tokens)))
}

/// POST /api/interview/guide
///
/// Generates a preparation guide for one catalog job.
pub async fn handle_guide(
    State(state): State<AppState>,
    Json(request): Json<GuideRequest>,
) -> Result<Json<GuideResponse>, AppError> {
    let provider = state.openai()?;

    let job_id = request
        .job_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("jobId is required".to_string()))?;

    let job = state
        .catalog
        .find_job(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let guide = generate_guide(&job, provider.as_ref()).await?;
    Ok(Json(GuideResponse { guide }))
}

/// POST /api/interview/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackReport>, AppError> {
    let provider = state.gemini()?;

    let history: Vec<ChatMessage> = request.history.iter().map(ChatMessage::from).collect();
    let report = generate_feedback(&request.context, &history, provider.as_ref()).await?;
    Ok(Json(report))
}
