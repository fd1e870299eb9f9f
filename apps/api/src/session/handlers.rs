use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::chat::{build_chat_request, build_stream_request, run_chat_turn};
use crate::interview::context::{CandidateProfile, JobData};
use crate::interview::relay::{open_token_stream, relay_turn, sse_response};
use crate::interview::{InterviewPhase, InterviewType, UserProfile};
use crate::session::InterviewSession;
use crate::sse::TurnOutcome;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    pub job_id: String,
    #[serde(default)]
    pub interview_type: InterviewType,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub message: String,
    pub phase: InterviewPhase,
    pub question_count: u32,
    pub complete: bool,
    pub timestamp: DateTime<Utc>,
}

fn validate_message(request: &TurnRequest) -> Result<(), AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<InterviewSession>) {
    let session = state.sessions.create(request.profile).await;
    info!("Created session {}", session.id);
    (StatusCode::CREATED, Json(session))
}

/// GET /api/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSession>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// DELETE /api/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Session not found".to_string()))
    }
}

/// POST /api/sessions/:id/interview
///
/// Starts a fresh interview for a catalog job; any previous transcript is discarded.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<InterviewSession>, AppError> {
    let job = state
        .catalog
        .find_job(&request.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let session = state
        .sessions
        .start_interview(id, &job, request.interview_type)
        .await?;
    info!("Session {id} started interview for job {}", job.id);
    Ok(Json(session))
}

/// POST /api/sessions/:id/turns
///
/// One-shot turn. The transcript and tracker change only if the provider answered.
pub async fn handle_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    validate_message(&request)?;
    let plan = state.sessions.plan_turn(id).await?;
    let provider = state.session_provider()?;

    let chat_request = build_chat_request(&plan.context, plan.phase, plan.history, &request.message);
    let reply = run_chat_turn(provider.as_ref(), &chat_request, plan.phase)
        .await
        .map_err(|e| AppError::from_llm("Failed to generate response", e))?;

    let progress = state
        .sessions
        .record_turn(id, plan.interview_id, &request.message, &reply.message)
        .await?;

    Ok(Json(TurnResponse {
        message: reply.message,
        phase: progress.phase,
        question_count: progress.question_count,
        complete: progress.complete,
        timestamp: reply.timestamp,
    }))
}

/// POST /api/sessions/:id/turns/stream
///
/// Streamed turn. The assembled message is recorded once the done frame is produced;
/// a failed or abandoned stream records nothing.
pub async fn handle_stream_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    validate_message(&request)?;
    let plan = state.sessions.plan_turn(id).await?;
    let provider = state.session_provider()?;

    let chat_request = build_stream_request(
        plan.interview_type,
        &JobData::from(&plan.context),
        &CandidateProfile::from(&plan.context.user_profile),
        plan.history,
        &request.message,
    );
    let tokens = open_token_stream(provider.as_ref(), &chat_request).await;

    let sessions = state.sessions.clone();
    let user_message = request.message;
    let interview_id = plan.interview_id;
    let events = relay_turn(tokens, move |outcome| async move {
        match outcome {
            TurnOutcome::Completed { message, .. } => {
                match sessions
                    .record_turn(id, interview_id, &user_message, &message)
                    .await
                {
                    Ok(progress) => info!(
                        "Session {id} recorded streamed turn ({} questions, {})",
                        progress.question_count, progress.phase
                    ),
                    Err(e) => warn!("Session {id} dropped streamed turn: {e}"),
                }
            }
            TurnOutcome::Failed { error, .. } => {
                warn!("Session {id} streamed turn failed: {error}");
            }
        }
    });

    Ok(sse_response(events))
}
