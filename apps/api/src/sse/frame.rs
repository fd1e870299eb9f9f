use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One frame of a relayed chat turn, as seen by the browser.
///
/// Wire shapes: `{"token": "..."}`, `{"done": true, "timestamp": "..."}`, `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayEvent {
    Token { token: String },
    Done { done: bool, timestamp: DateTime<Utc> },
    Error { error: String },
}

impl RelayEvent {
    pub fn token(text: impl Into<String>) -> Self {
        RelayEvent::Token { token: text.into() }
    }

    pub fn done(timestamp: DateTime<Utc>) -> Self {
        RelayEvent::Done {
            done: true,
            timestamp,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RelayEvent::Error {
            error: message.into(),
        }
    }

    /// Done and error frames end a turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelayEvent::Token { .. })
    }

    /// JSON payload for the `data:` field of an SSE frame.
    pub fn to_json(&self) -> String {
        // Serializing strings and a timestamp cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"serialization"}"#.to_string())
    }
}

#[cfg(test)]
impl RelayEvent {
    /// Full wire frame: `data: <json>\n\n`, as axum writes it.
    pub fn encode_frame(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}
