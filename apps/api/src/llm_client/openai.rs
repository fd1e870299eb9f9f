//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    api_error, build_http_client, sse_token_stream, ChatMessage, ChatProvider, ChatRequest,
    LlmError, StreamChunk, TokenStream, COMPLETION_TIMEOUT_SECS,
};
use crate::sse::SseFrame;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const STREAM_DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// One `chat.completion.chunk` from the streaming API.
#[derive(Debug, Deserialize)]
struct StreamChunkBody {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<super::ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<DeltaContent>,
}

/// Delta content is usually a string, but some models send an array of parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeltaContent {
    Text(String),
    Parts(Vec<DeltaPart>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeltaPart {
    Text(String),
    Object { text: Option<String> },
}

impl DeltaContent {
    fn into_text(self) -> String {
        match self {
            DeltaContent::Text(text) => text,
            DeltaContent::Parts(parts) => parts
                .into_iter()
                .map(|part| match part {
                    DeltaPart::Text(text) => text,
                    DeltaPart::Object { text } => text.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
            model,
            url: OPENAI_API_URL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        };

        let mut builder = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);
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

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response: CompletionResponse = self.send(request, false).await?.json().await?;

        if let Some(usage) = &response.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    async fn stream(&self, request: &ChatRequest) -> Result<TokenStream, LlmError> {
        let response = self.send(request, true).await?;
        Ok(sse_token_stream(response, parse_stream_frame))
    }
}

fn parse_stream_frame(frame: &SseFrame) -> Result<StreamChunk, LlmError> {
    let data = frame.data.trim();
    if data == STREAM_DONE_SENTINEL {
        return Ok(StreamChunk::End);
    }

    let chunk: StreamChunkBody = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(LlmError::Stream(error.message));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .map(DeltaContent::into_text)
        .collect();
    if text.is_empty() {
        return Ok(StreamChunk::Skip);
    }
    Ok(StreamChunk::Token(text))
}
