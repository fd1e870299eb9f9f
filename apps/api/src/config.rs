use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Provider API keys are optional: a missing key is reported per request, not at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub jobs_csv_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_live_model: String,
    pub gemini_live_voice: String,
    /// Sessions untouched for this long are discarded.
    pub session_idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            jobs_csv_path: PathBuf::from(env_or("JOBS_CSV_PATH", "data/jobs-db.csv")),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_live_model: env_or("GEMINI_LIVE_MODEL", "models/gemini-2.0-flash-exp"),
            gemini_live_voice: env_or("GEMINI_LIVE_VOICE", "Puck"),
            session_idle_timeout_secs: env_or("SESSION_IDLE_TIMEOUT_SECS", "1800")
                .parse::<u64>()
                .context("SESSION_IDLE_TIMEOUT_SECS must be a number of seconds")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Blank values count as unset so an empty `OPENAI_API_KEY=` line in `.env` behaves like absence.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
impl Config {
    /// Config for router tests: no keys, catalog at the given path.
    pub fn for_tests(jobs_csv_path: PathBuf) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            jobs_csv_path,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_live_model: "models/gemini-2.0-flash-exp".to_string(),
            gemini_live_voice: "Puck".to_string(),
            session_idle_timeout_secs: 1800,
        }
    }
}
