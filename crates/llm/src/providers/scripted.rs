//! Scripted chat provider.
//!
//! Replays a fixed queue of replies and records every request it receives.
//! Used by pipeline tests to drive generate/judge/repair deterministically.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use compliance_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One canned reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text as the completion
    Text(String),
    /// Fail with an upstream error carrying this message
    Fail(String),
    /// Wait, then return the text
    Delayed(Duration, String),
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// Chat client that answers from a queue of [`ScriptedReply`] values.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    /// Create a client that replays `replies` in order.
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<ScriptedReply> {
        self.requests
            .lock()
            .map_err(|_| AppError::Other("scripted request log poisoned".to_string()))?
            .push(request.clone());

        self.replies
            .lock()
            .map_err(|_| AppError::Other("scripted reply queue poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| AppError::Llm("Scripted client has no replies left".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = match self.next_reply(request)? {
            ScriptedReply::Text(content) => content,
            ScriptedReply::Fail(message) => return Err(AppError::Llm(message)),
            ScriptedReply::Delayed(delay, content) => {
                tokio::time::sleep(delay).await;
                content
            }
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
