use crate::infra::{AppState, TrainerState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use support_trainer::error::AppError;
use support_trainer::knowledge::KnowledgeSummary;
use support_trainer::scoring::{ScoreComponent, ScoreSet};
use support_trainer::session::{SessionId, SessionView, TranscriptEntry, TurnOutcome};
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) elapsed_seconds: f64,
    #[serde(default)]
    pub(crate) explain: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    #[serde(flatten)]
    pub(crate) scores: ScoreSet,
    pub(crate) overall: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) components: Option<Vec<ScoreComponent>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScenarioSummary {
    pub(crate) name: &'static str,
    pub(crate) title: &'static str,
    pub(crate) opening_message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub(crate) scenario: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRequest {
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TurnResponse {
    #[serde(flatten)]
    pub(crate) outcome: TurnOutcome,
    pub(crate) overall: f64,
    pub(crate) transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KnowledgeRequest {
    #[serde(default)]
    pub(crate) csv: Option<String>,
    #[serde(default)]
    pub(crate) google_sheets_url: Option<String>,
}

pub(crate) fn trainer_router(state: TrainerState) -> Router {
    Router::new()
        .route("/api/v1/score", post(score_endpoint))
        .route("/api/v1/scenarios", get(scenarios_endpoint))
        .route("/api/v1/sessions", post(start_session_endpoint))
        .route(
            "/api/v1/sessions/:session_id",
            get(session_endpoint).delete(end_session_endpoint),
        )
        .route(
            "/api/v1/sessions/:session_id/messages",
            post(message_endpoint),
        )
        .route(
            "/api/v1/sessions/:session_id/restart",
            post(restart_session_endpoint),
        )
        .route("/api/v1/knowledge", post(knowledge_endpoint))
        .with_state(state)
}

pub(crate) fn with_service_routes(state: TrainerState) -> Router {
    trainer_router(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn score_endpoint(
    State(state): State<TrainerState>,
    Json(payload): Json<ScoreRequest>,
) -> Json<ScoreResponse> {
    let scorer = state.sessions.scorer();
    let response = if payload.explain {
        let report = scorer.explain(&payload.message, payload.elapsed_seconds);
        ScoreResponse {
            overall: report.scores.overall(),
            scores: report.scores,
            components: Some(report.components),
        }
    } else {
        let scores = scorer.score(&payload.message, payload.elapsed_seconds);
        ScoreResponse {
            overall: scores.overall(),
            scores,
            components: None,
        }
    };
    Json(response)
}

pub(crate) async fn scenarios_endpoint(
    State(state): State<TrainerState>,
) -> Json<Vec<ScenarioSummary>> {
    let scenarios = state
        .sessions
        .catalog()
        .scenarios()
        .iter()
        .map(|scenario| ScenarioSummary {
            name: scenario.name,
            title: scenario.title,
            opening_message: scenario.opening_message,
        })
        .collect();
    Json(scenarios)
}

pub(crate) async fn start_session_endpoint(
    State(state): State<TrainerState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let view = state
        .sessions
        .start(payload.scenario.as_deref(), Utc::now())?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn session_endpoint(
    State(state): State<TrainerState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(&SessionId(session_id))?))
}

pub(crate) async fn end_session_endpoint(
    State(state): State<TrainerState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = SessionId(session_id);
    state.sessions.remove(&id)?;
    info!(session_id = %id, "simulation closed");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn restart_session_endpoint(
    State(state): State<TrainerState>,
    Path(session_id): Path<String>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.sessions.restart(
        &SessionId(session_id),
        payload.scenario.as_deref(),
        Utc::now(),
    )?;
    Ok(Json(view))
}

pub(crate) async fn message_endpoint(
    State(state): State<TrainerState>,
    Path(session_id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let id = SessionId(session_id);
    let outcome = state
        .sessions
        .respond(&id, &payload.message, state.completion.as_ref(), Utc::now())
        .await?;
    let transcript = state.sessions.view(&id)?.transcript;

    Ok(Json(TurnResponse {
        overall: outcome.scores.overall(),
        outcome,
        transcript,
    }))
}

pub(crate) async fn knowledge_endpoint(
    State(state): State<TrainerState>,
    Json(payload): Json<KnowledgeRequest>,
) -> Result<Json<KnowledgeSummary>, AppError> {
    let base = match (payload.csv, payload.google_sheets_url) {
        (Some(csv), _) => state.knowledge.import_reader(csv.as_bytes())?,
        (None, Some(url)) => state.knowledge.import_sheet(&url).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "either csv or googleSheetsUrl is required".to_string(),
            ))
        }
    };
    Ok(Json(base.summary()))
}
