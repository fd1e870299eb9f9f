use std::sync::Arc;

use crate::catalog::JobCatalog;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::ChatProvider;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: JobCatalog,
    /// Absent when `OPENAI_API_KEY` is unset; routes that need it answer 500.
    pub openai: Option<Arc<dyn ChatProvider>>,
    /// Absent when `GEMINI_API_KEY` is unset.
    pub gemini: Option<Arc<dyn ChatProvider>>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn openai(&self) -> Result<Arc<dyn ChatProvider>, AppError> {
        self.openai
            .clone()
            .ok_or_else(|| AppError::MissingConfig("OPENAI_API_KEY is not configured".to_string()))
    }

    pub fn gemini(&self) -> Result<Arc<dyn ChatProvider>, AppError> {
        self.gemini
            .clone()
            .ok_or_else(|| AppError::MissingConfig("Gemini API key not configured".to_string()))
    }

    /// Provider for session turns: OpenAI when configured, otherwise Gemini.
    pub fn session_provider(&self) -> Result<Arc<dyn ChatProvider>, AppError> {
        self.openai().or_else(|_| self.gemini()).map_err(|_| {
            AppError::MissingConfig(
                "Neither OPENAI_API_KEY nor GEMINI_API_KEY is configured".to_string(),
            )
        })
    }
}
