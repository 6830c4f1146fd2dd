mod http;
mod provider;

pub use http::HttpCompletionService;
pub use provider::{
    ChatMessage, CompletionFuture, CompletionRequest, CompletionResponse, CompletionService,
    LlmError, Role, ScriptedCompletion, TokenUsage,
};
