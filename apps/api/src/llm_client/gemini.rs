//! Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    api_error, build_http_client, sse_token_stream, ChatProvider, ChatRequest, ChatRole,
    LlmError, StreamChunk, TokenStream, COMPLETION_TIMEOUT_SECS,
};
use crate::sse::SseFrame;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`. Omitted for system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined in order.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let url = if stream {
            format!("{}/{}:streamGenerateContent?alt=sse", self.base_url, self.model)
        } else {
            format!("{}/{}:generateContent", self.base_url, self.model)
        };

        let mut builder = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request));
        if !stream {
            builder = builder.timeout(std::time::Duration::from_secs(COMPLETION_TIMEOUT_SECS));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response)
    }
}

/// Maps the neutral request onto Gemini's shape: system messages become
/// `systemInstruction`, assistant turns become `model` turns.
fn build_body(request: &ChatRequest) -> GenerateBody {
    let contents = request
        .messages
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                ChatRole::System => return None,
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            Some(Content {
                role: Some(role.to_string()),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
        })
        .collect();

    GenerateBody {
        system_instruction: request.system_text().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        contents,
        generation_config: GenerationConfig {
            temperature: request.temperature,
            top_k: TOP_K,
            top_p: TOP_P,
            max_output_tokens: request.max_tokens,
        },
    }
}

#[async_trait]
impl ChatProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response: GenerateResponse = self.send(request, false).await?.json().await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        if let Some(reason) = response.block_reason() {
            warn!("Gemini blocked the prompt: {reason}");
            return Err(LlmError::Api {
                status: 400,
                message: format!("prompt blocked: {reason}"),
            });
        }

        let text = response.text();
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }

    async fn stream(&self, request: &ChatRequest) -> Result<TokenStream, LlmError> {
        let response = self.send(request, true).await?;
        Ok(sse_token_stream(response, parse_stream_frame))
    }
}

fn parse_stream_frame(frame: &SseFrame) -> Result<StreamChunk, LlmError> {
    let value: serde_json::Value = serde_json::from_str(&frame.data)?;
    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(LlmError::Stream(message.to_string()));
    }

    let chunk: GenerateResponse = serde_json::from_value(value)?;
    if let Some(reason) = chunk.block_reason() {
        return Err(LlmError::Stream(format!("prompt blocked: {reason}")));
    }
    let text = chunk.text();
    if text.is_empty() {
        return Ok(StreamChunk::Skip);
    }
    Ok(StreamChunk::Token(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ChatMessage;

    #[test]
    fn test_body_maps_roles_and_system_instruction() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("You are an interviewer."),
            ChatMessage::assistant("Welcome!"),
            ChatMessage::user("Hello"),
        ])
        .max_tokens(200);

        let value = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "You are an interviewer."
        );
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"].as_array().unwrap().len(), 2);
        assert_eq!(value["contents"][0]["role"], "model");
        assert_eq!(value["contents"][1]["role"], "user");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 200);
    }

    #[test]
    fn test_stream_frame_joins_parts() {
        let frame = SseFrame {
            event: None,
            data: r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#
                .to_string(),
        };
        match parse_stream_frame(&frame).unwrap() {
            StreamChunk::Token(text) => assert_eq!(text, "Hello"),
            _ => panic!("expected token"),
        }
    }

    #[test]
    fn test_stream_frame_error() {
        let frame = SseFrame {
            event: None,
            data: r#"{"error":{"code":429,"message":"quota exceeded"}}"#.to_string(),
        };
        assert!(matches!(
            parse_stream_frame(&frame),
            Err(LlmError::Stream(msg)) if msg == "quota exceeded"
        ));
    }

    #[test]
    fn test_blocked_prompt_is_reported() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(response.block_reason(), Some("SAFETY"));
        assert_eq!(response.text(), "");
    }
}
