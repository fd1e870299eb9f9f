pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalog::handlers as catalog_handlers;
use crate::interview::handlers as interview_handlers;
use crate::realtime::handlers as realtime_handlers;
use crate::session::handlers as session_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job catalog
        .route("/api/jobs", get(catalog_handlers::handle_list_jobs))
        .route("/api/jobs/:id", get(catalog_handlers::handle_get_job))
        // Stateless interview API
        .route("/api/interview/guide", post(interview_handlers::handle_guide))
        .route("/api/interview/chat", post(interview_handlers::handle_chat))
        .route(
            "/api/interview/openai-chat",
            post(interview_handlers::handle_openai_chat),
        )
        .route(
            "/api/interview/feedback",
            post(interview_handlers::handle_feedback),
        )
        .route("/api/interview/live", get(realtime_handlers::handle_live))
        // Sessions
        .route("/api/sessions", post(session_handlers::handle_create_session))
        .route(
            "/api/sessions/:id",
            get(session_handlers::handle_get_session).delete(session_handlers::handle_delete_session),
        )
        .route(
            "/api/sessions/:id/interview",
            post(session_handlers::handle_start_interview),
        )
        .route("/api/sessions/:id/turns", post(session_handlers::handle_turn))
        .route(
            "/api/sessions/:id/turns/stream",
            post(session_handlers::handle_stream_turn),
        )
        .with_state(state)
}
