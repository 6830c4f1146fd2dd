//! OpenAI-compatible chat-completions client (DeepSeek by default).

use super::provider::{
    CompletionFuture, CompletionRequest, CompletionResponse, CompletionService, LlmError,
    TokenUsage,
};
use crate::config::CompletionConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub struct HttpCompletionService {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpCompletionService {
    pub fn from_config(config: &CompletionConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured("DEEPSEEK_API_KEY is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| LlmError::NotConfigured(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&config.base_url),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|message| ChatRequestMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, messages = body.messages.len(), "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::RequestFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "completion service rejected request");
            return Err(status_error(status, text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| LlmError::RequestFailed(err.to_string()))?;

        into_completion(parsed, &self.model)
    }
}

impl CompletionService for HttpCompletionService {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(self.send(request))
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn status_error(status: reqwest::StatusCode, body: String) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited
    } else {
        LlmError::RequestFailed(format!("{status}: {body}"))
    }
}

fn into_completion(response: ChatResponse, model: &str) -> Result<CompletionResponse, LlmError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;
    let usage = response
        .usage
        .map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: model.to_string(),
        usage,
    })
}
