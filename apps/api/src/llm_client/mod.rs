/// LLM Client: the single point of entry for all model provider calls in Mockview.
///
/// ARCHITECTURAL RULE: No other module may call a provider HTTP API directly.
/// Handlers hold an `Arc<dyn ChatProvider>` and never know which vendor is behind it.
///
/// No retries: one upstream failure is one caller-visible failure.
use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::sse::{SseDecoder, SseFrame};

pub mod gemini;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub mod testing;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Timeout applied to one-shot completions. Streams are bounded only by the transport.
const COMPLETION_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// The model's text was supposed to be JSON and was not.
    #[error("LLM returned malformed JSON: {source}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-neutral chat request. System messages are mapped to each vendor's
/// own system-instruction mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Concatenated system messages, if any.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }
}

/// Incremental text produced by a streaming completion.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A hosted chat-completion backend.
///
/// Carried in `AppState` as `Arc<dyn ChatProvider>`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short vendor name for logs.
    fn name(&self) -> &'static str;

    /// One-shot completion returning the full reply text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Streaming completion yielding text increments in upstream order.
    async fn stream(&self, request: &ChatRequest) -> Result<TokenStream, LlmError>;
}

/// Calls the provider and deserializes the reply as JSON after stripping code fences.
/// A reply that is not valid JSON is reported as `MalformedJson` with the raw text.
pub async fn complete_json<T: DeserializeOwned>(
    provider: &dyn ChatProvider,
    request: &ChatRequest,
) -> Result<T, LlmError> {
    let raw = provider.complete(request).await?;
    let cleaned = strip_json_fences(&raw);
    serde_json::from_str(cleaned).map_err(|source| LlmError::MalformedJson {
        source,
        raw: raw.clone(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the span from the first `{` to the last `}`, for replies that wrap
/// a JSON object in prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Error envelope shared by both vendors: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turns a non-success response into `LlmError::Api`, preferring the vendor's message.
async fn api_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}

fn build_http_client() -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()?)
}

/// What a vendor-specific frame handler made of one SSE frame.
/// Handlers return `Skip` rather than an empty token.
#[derive(Debug, PartialEq)]
pub(crate) enum StreamChunk {
    Token(String),
    Skip,
    End,
}

struct SseStreamState<F> {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    decoder: Option<SseDecoder>,
    queue: VecDeque<Result<String, LlmError>>,
    finished: bool,
    on_frame: F,
}

/// Adapts a streaming HTTP response into a `TokenStream`.
///
/// Frames are decoded incrementally; the first error (transport or vendor-reported)
/// is yielded once and ends the stream.
pub(crate) fn sse_token_stream<F>(response: reqwest::Response, on_frame: F) -> TokenStream
where
    F: FnMut(&SseFrame) -> Result<StreamChunk, LlmError> + Send + 'static,
{
    let state = SseStreamState {
        bytes: Box::pin(response.bytes_stream()),
        decoder: Some(SseDecoder::new()),
        queue: VecDeque::new(),
        finished: false,
        on_frame,
    };

    Box::pin(futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.queue.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            let frames = match st.bytes.next().await {
                Some(Ok(chunk)) => st
                    .decoder
                    .as_mut()
                    .map(|d| d.push(&chunk))
                    .unwrap_or_default(),
                Some(Err(e)) => {
                    st.queue.push_back(Err(LlmError::Http(e)));
                    st.finished = true;
                    continue;
                }
                None => {
                    st.finished = true;
                    st.decoder
                        .take()
                        .and_then(SseDecoder::finish)
                        .into_iter()
                        .collect()
                }
            };

            for frame in &frames {
                match (st.on_frame)(frame) {
                    Ok(StreamChunk::Token(text)) => st.queue.push_back(Ok(text)),
                    Ok(StreamChunk::Skip) => {}
                    Ok(StreamChunk::End) => {
                        st.finished = true;
                        break;
                    }
                    Err(e) => {
                        st.queue.push_back(Err(e));
                        st.finished = true;
                        break;
                    }
                }
            }
        }
    }))
}
