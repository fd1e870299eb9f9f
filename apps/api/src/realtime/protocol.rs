//! Wire shapes for both sockets: the vendor's BidiGenerateContent messages and the
//! small JSON protocol spoken with the browser.

use serde::{Deserialize, Serialize};

use crate::interview::{InterviewContext, InterviewPhase};

// ────────────────────────────────────────────────────────────────────────────
// Upstream: client → vendor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: LiveGenerationConfig,
    pub system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize)]
pub struct Turn {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Turn>,
    pub turn_complete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<InlineData>,
}

/// One message sent to the vendor. Exactly one field is set per message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    ClientContent(ClientContent),
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    pub fn setup(model: &str, voice: &str, system_instruction: String) -> Self {
        ClientMessage::Setup(Setup {
            model: model.to_string(),
            generation_config: LiveGenerationConfig {
                response_modalities: vec!["AUDIO".to_string(), "TEXT".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                },
            },
            system_instruction: SystemInstruction {
                parts: vec![Part::text(system_instruction)],
            },
        })
    }

    /// A complete user turn made of the given parts.
    pub fn user_turn(parts: Vec<Part>) -> Self {
        ClientMessage::ClientContent(ClientContent {
            turns: vec![Turn {
                role: "user".to_string(),
                parts,
            }],
            turn_complete: true,
        })
    }

    pub fn media_chunk(mime_type: &str, data: String) -> Self {
        ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![InlineData {
                mime_type: mime_type.to_string(),
                data,
            }],
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Upstream: vendor → client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    #[serde(default)]
    pub turn_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub setup_complete: Option<serde_json::Value>,
    pub server_content: Option<ServerContent>,
    pub error: Option<serde_json::Value>,
}

impl ServerMessage {
    /// Human-readable text of a server `error`, if present.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| {
            e.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Browser bridge
// ────────────────────────────────────────────────────────────────────────────

/// JSON frames the browser sends. Raw PCM arrives as binary frames instead.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserFrame {
    Start {
        #[serde(default)]
        context: InterviewContext,
        #[serde(default)]
        phase: InterviewPhase,
    },
    Text {
        text: String,
    },
    Phase {
        phase: InterviewPhase,
    },
    /// A complete recorded utterance, base64 PCM.
    Audio {
        data: String,
    },
}

/// JSON frames sent to the browser. Audio goes down as binary WAV frames.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeFrame {
    Ready,
    Text { text: String },
    TurnComplete,
    Error { message: String, fallback: String },
}

impl BridgeFrame {
    /// Tells the browser to fall back to the streamed text interview.
    pub fn fallback(message: impl Into<String>) -> Self {
        BridgeFrame::Error {
            message: message.into(),
            fallback: "stream".to_string(),
        }
    }
}
