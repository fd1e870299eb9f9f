//! Upstream live session over the vendor's bidirectional WebSocket.

use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::Config;
use crate::interview::prompts::live_system_instruction;
use crate::interview::{InterviewContext, InterviewPhase};
use crate::realtime::protocol::{ClientMessage, Part, ServerMessage};
use crate::realtime::wav::convert_to_wav;

const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const PCM_MIME_TYPE: &str = "audio/pcm";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timed out waiting for setup to complete")]
    SetupTimeout,

    #[error("server rejected the session: {0}")]
    Rejected(String),

    #[error("connection closed before setup completed")]
    Closed,
}

/// Connection settings for the live model.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub api_key: String,
    pub model: String,
    pub voice: String,
}

impl LiveConfig {
    /// `None` when no Gemini key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.gemini_api_key.as_ref().map(|api_key| Self {
            api_key: api_key.clone(),
            model: config.gemini_live_model.clone(),
            voice: config.gemini_live_voice.clone(),
        })
    }
}

/// What the live model produced, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Text(String),
    /// WAV of all audio received so far in the current turn.
    Audio(Vec<u8>),
    /// A fragment that could not be packaged; it was left out of the turn's audio.
    AudioDropped(String),
    TurnComplete,
    Error(String),
}

/// Per-turn audio accumulator. Pure; fed one decoded server message at a time.
#[derive(Debug, Default)]
pub struct LiveTurnState {
    audio_parts: Vec<String>,
}

impl LiveTurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, mut message: ServerMessage) -> Vec<LiveEvent> {
        let mut events = Vec::new();

        if let Some(content) = message.server_content.take() {
            let parts = content.model_turn.map(|t| t.parts).unwrap_or_default();
            for part in parts {
                if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                    events.push(LiveEvent::Text(text));
                }
                if let Some(inline) = part.inline_data {
                    self.audio_parts.push(inline.data);
                    match convert_to_wav(&self.audio_parts, &inline.mime_type) {
                        Ok(wav) => events.push(LiveEvent::Audio(wav)),
                        Err(e) => {
                            // Drop the bad fragment so later ones still decode.
                            self.audio_parts.pop();
                            events.push(LiveEvent::AudioDropped(e.to_string()));
                        }
                    }
                }
            }
            if content.turn_complete {
                self.audio_parts.clear();
                events.push(LiveEvent::TurnComplete);
            }
        }

        if let Some(message) = message.error_message() {
            events.push(LiveEvent::Error(message));
        }

        events
    }
}

/// An established live session. Split it to read and write concurrently.
pub struct LiveSession {
    sender: LiveSender,
    receiver: LiveReceiver,
}

impl LiveSession {
    /// Opens the socket, sends `setup`, and waits for `setupComplete`.
    pub async fn connect(
        config: &LiveConfig,
        context: &InterviewContext,
        phase: InterviewPhase,
    ) -> Result<Self, LiveError> {
        let url = format!("{LIVE_ENDPOINT}?key={}", config.api_key);
        let setup = ClientMessage::setup(
            &config.model,
            &config.voice,
            live_system_instruction(context, phase),
        );

        let handshake = async {
            let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
            let (sink, stream) = socket.split();
            let mut sender = LiveSender { sink };
            let mut receiver = LiveReceiver {
                stream,
                turn: LiveTurnState::new(),
            };

            sender.send(&setup).await?;
            receiver.wait_for_setup().await?;
            Ok::<_, LiveError>(LiveSession { sender, receiver })
        };

        let session = tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), handshake)
            .await
            .map_err(|_| LiveError::SetupTimeout)??;
        info!("Live session ready (model: {}, phase: {phase})", config.model);
        Ok(session)
    }

    pub fn split(self) -> (LiveSender, LiveReceiver) {
        (self.sender, self.receiver)
    }
}

/// Write half of a live session.
pub struct LiveSender {
    sink: SplitSink<WsStream, Message>,
}

impl LiveSender {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), LiveError> {
        let json = serde_json::to_string(message)?;
        self.sink.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Sends a complete text turn.
    pub async fn send_text(&mut self, text: &str) -> Result<(), LiveError> {
        self.send(&ClientMessage::user_turn(vec![Part::text(text)]))
            .await
    }

    /// Sends a complete recorded utterance as one turn.
    pub async fn send_audio(&mut self, pcm: &[u8]) -> Result<(), LiveError> {
        let part = Part::inline(PCM_MIME_TYPE, BASE64_STANDARD.encode(pcm));
        self.send(&ClientMessage::user_turn(vec![part])).await
    }

    /// Streams a microphone chunk without ending the turn.
    pub async fn stream_audio(&mut self, pcm: &[u8]) -> Result<(), LiveError> {
        self.send(&ClientMessage::media_chunk(
            PCM_MIME_TYPE,
            BASE64_STANDARD.encode(pcm),
        ))
        .await
    }

    /// Tells the model the interview moved on. The system instruction is not resent.
    pub async fn update_phase(&mut self, phase: InterviewPhase) -> Result<(), LiveError> {
        self.send_text(&phase_notice(phase)).await
    }

    pub async fn close(mut self) {
        let _ = self.sink.close().await;
    }
}

fn phase_notice(phase: InterviewPhase) -> String {
    format!("[System: Moving to {phase} phase]")
}

/// Read half of a live session.
pub struct LiveReceiver {
    stream: SplitStream<WsStream>,
    turn: LiveTurnState,
}

impl LiveReceiver {
    /// Next batch of events. `None` once the vendor closes the socket.
    pub async fn next_events(&mut self) -> Option<Result<Vec<LiveEvent>, LiveError>> {
        loop {
            match self.next_message().await? {
                Ok(Some(message)) => return Some(Ok(self.turn.apply(message))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Reads one frame. `Ok(None)` for control frames that carry no message.
    async fn next_message(&mut self) -> Option<Result<Option<ServerMessage>, LiveError>> {
        let frame = match self.stream.next().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e.into())),
        };
        let parsed: Result<Option<ServerMessage>, serde_json::Error> = match frame {
            Message::Text(text) => serde_json::from_str(text.as_str()).map(Some),
            Message::Binary(bytes) => serde_json::from_slice(&bytes).map(Some),
            Message::Close(reason) => {
                debug!("Live socket closed by server: {reason:?}");
                return None;
            }
            _ => Ok(None),
        };
        Some(parsed.map_err(LiveError::from))
    }

    async fn wait_for_setup(&mut self) -> Result<(), LiveError> {
        loop {
            match self.next_message().await {
                None => return Err(LiveError::Closed),
                Some(Err(e)) => return Err(e),
                Some(Ok(None)) => continue,
                Some(Ok(Some(message))) => {
                    if let Some(error) = message.error_message() {
                        return Err(LiveError::Rejected(error));
                    }
                    if message.setup_complete.is_some() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
