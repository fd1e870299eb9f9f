//! In-process provider for tests. Replies and token sequences are scripted up front.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatProvider, ChatRequest, LlmError, TokenStream};

pub struct ScriptedProvider {
    reply: Result<String, String>,
    tokens: Vec<Result<String, String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// One-shot calls return `reply`; streams yield its characters in two halves.
    pub fn replying(reply: &str) -> Self {
        let mid = reply
            .char_indices()
            .nth(reply.chars().count() / 2)
            .map_or(reply.len(), |(i, _)| i);
        Self {
            reply: Ok(reply.to_string()),
            tokens: vec![Ok(reply[..mid].to_string()), Ok(reply[mid..].to_string())],
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an upstream API error.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            tokens: vec![Err(message.to_string())],
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Streams yield exactly these items; `Err` items become stream errors.
    pub fn streaming(tokens: Vec<Result<&str, &str>>) -> Self {
        Self {
            reply: Err("one-shot calls are not scripted".to_string()),
            tokens: tokens
                .into_iter()
                .map(|t| t.map(str::to_string).map_err(str::to_string))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &ChatRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.record(request);
        self.reply.clone().map_err(|message| LlmError::Api {
            status: 500,
            message,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> Result<TokenStream, LlmError> {
        self.record(request);
        let items: Vec<Result<String, LlmError>> = self
            .tokens
            .iter()
            .cloned()
            .map(|item| item.map_err(LlmError::Stream))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}
