use crate::config::ConfigError;
use crate::knowledge::KnowledgeImportError;
use crate::llm::LlmError;
use crate::scoring::ScoringConfigError;
use crate::session::SessionError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Scoring(ScoringConfigError),
    Session(SessionError),
    Completion(LlmError),
    Knowledge(KnowledgeImportError),
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Session(SessionError::UnknownSession(_)) => StatusCode::NOT_FOUND,
            AppError::Session(
                SessionError::AwaitingReply
                | SessionError::NotAwaitingReply
                | SessionError::Superseded,
            ) => StatusCode::CONFLICT,
            AppError::Session(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Knowledge(KnowledgeImportError::Download(_)) => StatusCode::BAD_GATEWAY,
            AppError::Knowledge(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Completion(LlmError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Completion(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Session(err) => write!(f, "session error: {}", err),
            AppError::Completion(err) => write!(f, "completion error: {}", err),
            AppError::Knowledge(err) => write!(f, "knowledge import error: {}", err),
            AppError::BadRequest(message) => write!(f, "bad request: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Completion(err) => Some(err),
            AppError::Knowledge(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ScoringConfigError> for AppError {
    fn from(value: ScoringConfigError) -> Self {
        Self::Scoring(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        Self::Completion(value)
    }
}

impl From<KnowledgeImportError> for AppError {
    fn from(value: KnowledgeImportError) -> Self {
        Self::Knowledge(value)
    }
}
