use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sse::RelayEvent;
#[cfg(test)]
use crate::sse::SseFrame;

/// Result of one relayed turn. Failures are values, not placeholder text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Failed {
        error: String,
        /// Text received before the failure. Never presented as a finished answer.
        partial: String,
    },
}

/// Rebuilds a complete message from a sequence of relay events.
///
/// The first terminal event fixes the outcome; anything after it is ignored, so a
/// message is produced at most once per turn.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    message: String,
    outcome: Option<TurnOutcome>,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. Returns the outcome only on the event that ends the turn.
    pub fn apply(&mut self, event: &RelayEvent) -> Option<TurnOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        let outcome = match event {
            RelayEvent::Token { token } => {
                self.message.push_str(token);
                return None;
            }
            RelayEvent::Done { timestamp, .. } => TurnOutcome::Completed {
                message: self.message.clone(),
                timestamp: *timestamp,
            },
            RelayEvent::Error { error } => TurnOutcome::Failed {
                error: error.clone(),
                partial: self.message.clone(),
            },
        };

        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Final outcome. A stream that ended without a terminal frame counts as a failure.
    pub fn finish(self) -> TurnOutcome {
        self.outcome.unwrap_or(TurnOutcome::Failed {
            error: "stream ended before completion".to_string(),
            partial: self.message,
        })
    }
}

#[cfg(test)]
impl TranscriptAssembler {
    /// Applies a decoded SSE frame carrying a relay payload.
    pub fn apply_frame(&mut self, frame: &SseFrame) -> Result<Option<TurnOutcome>, serde_json::Error> {
        let event: RelayEvent = serde_json::from_str(&frame.data)?;
        Ok(self.apply(&event))
    }

    pub fn partial(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::sse::SseDecoder;

    #[test]
    fn test_reconstructs_message_once_with_frame_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
        let wire = [
            RelayEvent::token("Hel"),
            RelayEvent::token("lo"),
            RelayEvent::done(ts),
        ]
        .iter()
        .map(RelayEvent::encode_frame)
        .collect::<String>();

        let mut decoder = SseDecoder::new();
        let mut assembler = TranscriptAssembler::new();
        let mut outcomes = Vec::new();

        // Feed in awkward 5-byte reads.
        for chunk in wire.as_bytes().chunks(5) {
            for frame in decoder.push(chunk) {
                outcomes.extend(assembler.apply_frame(&frame).unwrap());
            }
        }

        assert_eq!(
            outcomes,
            vec![TurnOutcome::Completed {
                message: "Hello".to_string(),
                timestamp: ts,
            }]
        );
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&RelayEvent::token("Hi"));
        assert!(assembler.apply(&RelayEvent::done(ts)).is_some());
        assert!(assembler.apply(&RelayEvent::token(" again")).is_none());
        assert!(assembler.apply(&RelayEvent::done(ts)).is_none());

        match assembler.finish() {
            TurnOutcome::Completed { message, .. } => assert_eq!(message, "Hi"),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn test_error_frame_fails_turn_with_partial_text() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&RelayEvent::token("Par"));
        let outcome = assembler.apply(&RelayEvent::error("connection reset"));
        assert_eq!(
            outcome,
            Some(TurnOutcome::Failed {
                error: "connection reset".to_string(),
                partial: "Par".to_string(),
            })
        );
    }

    #[test]
    fn test_stream_without_terminal_frame_is_a_failure() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&RelayEvent::token("dangling"));
        assert_eq!(assembler.partial(), "dangling");
        assert!(matches!(assembler.finish(), TurnOutcome::Failed { .. }));
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        let mut assembler = TranscriptAssembler::new();
        let frame = SseFrame {
            event: None,
            data: "not json".to_string(),
        };
        assert!(assembler.apply_frame(&frame).is_err());
    }
}
