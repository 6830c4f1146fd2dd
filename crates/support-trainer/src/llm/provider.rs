use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Persona instruction plus transcript, ready to send to a chat-completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion service is not configured: {0}")]
    NotConfigured(String),
    #[error("rate limited by completion service")]
    RateLimited,
    #[error("completion request failed: {0}")]
    RequestFailed(String),
    #[error("completion service returned an empty reply")]
    EmptyResponse,
}

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Backend that produces the simulated customer's next utterance.
pub trait CompletionService: Send + Sync {
    fn name(&self) -> &str;

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_>;
}

/// Replays queued replies in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|reply| Ok(reply.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a failure that surfaces as [`LlmError::RequestFailed`].
    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .expect("scripted replies mutex poisoned")
            .push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("scripted requests mutex poisoned")
            .clone()
    }
}

impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        self.requests
            .lock()
            .expect("scripted requests mutex poisoned")
            .push(request);
        let next = self
            .replies
            .lock()
            .expect("scripted replies mutex poisoned")
            .pop_front();

        Box::pin(async move {
            match next {
                Some(Ok(content)) => Ok(CompletionResponse {
                    content,
                    model: "scripted".to_string(),
                    usage: TokenUsage::default(),
                }),
                Some(Err(message)) => Err(LlmError::RequestFailed(message)),
                None => Err(LlmError::EmptyResponse),
            }
        })
    }
}
