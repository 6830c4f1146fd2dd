use super::controller::{SessionController, SessionState, TranscriptEntry};
use super::scenario::{ScenarioCatalog, ScenarioDefinition};
use super::SessionError;
use crate::llm::{CompletionService, TokenUsage};
use crate::scoring::{ResponseScorer, ScoreSet};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializable snapshot of a session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioDefinition>,
    pub started_at: Option<DateTime<Utc>>,
    pub latest_scores: Option<ScoreSet>,
    pub transcript: Vec<TranscriptEntry>,
}

/// Result of one trainee turn. Scores are always present; the reply is missing when the
/// completion service failed, in which case the trainee may simply send again.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub scores: ScoreSet,
    pub customer_reply: Option<TranscriptEntry>,
    /// Model that voiced the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_error: Option<String>,
}

/// Simulations untouched for this long are dropped when a new one starts.
pub const DEFAULT_IDLE_TIMEOUT_MINUTES: i64 = 120;

/// In-memory set of live simulations.
pub struct SessionRegistry {
    scorer: Arc<ResponseScorer>,
    catalog: ScenarioCatalog,
    sessions: Mutex<HashMap<SessionId, SessionController>>,
    sequence: AtomicU64,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(scorer: Arc<ResponseScorer>, catalog: ScenarioCatalog) -> Self {
        Self {
            scorer,
            catalog,
            sessions: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(1),
            idle_timeout: Duration::minutes(DEFAULT_IDLE_TIMEOUT_MINUTES),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn len(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn scorer(&self) -> &ResponseScorer {
        &self.scorer
    }

    /// Opens a new simulation, picking a random scenario unless one is named.
    pub fn start(
        &self,
        scenario: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, SessionError> {
        self.start_with_rng(scenario, now, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        &self,
        scenario: Option<&str>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<SessionView, SessionError> {
        let scenario = self.resolve_scenario(scenario, rng)?;
        let scenario_name = scenario.name;
        let id = self.next_session_id();

        let mut controller = SessionController::new(self.scorer.clone());
        controller.start(scenario, now);
        let view = view_of(&id, &controller);

        let mut sessions = self.lock_sessions();
        self.evict_idle(&mut sessions, now);
        sessions.insert(id.clone(), controller);
        info!(session_id = %id, scenario = scenario_name, "simulation started");
        Ok(view)
    }

    /// Starts the named (or a random) scenario again inside an existing session.
    pub fn restart(
        &self,
        id: &SessionId,
        scenario: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, SessionError> {
        let scenario = self.resolve_scenario(scenario, &mut rand::thread_rng())?;
        let mut sessions = self.lock_sessions();
        let controller = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownSession(id.0.clone()))?;
        controller.start(scenario, now);
        info!(session_id = %id, "simulation restarted");
        Ok(view_of(id, controller))
    }

    pub fn view(&self, id: &SessionId) -> Result<SessionView, SessionError> {
        let sessions = self.lock_sessions();
        let controller = sessions
            .get(id)
            .ok_or_else(|| SessionError::UnknownSession(id.0.clone()))?;
        Ok(view_of(id, controller))
    }

    pub fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        self.lock_sessions()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SessionError::UnknownSession(id.0.clone()))
    }

    /// Scores the trainee message, then asks `completion` for the customer's reply.
    /// The registry lock is released while the completion call is in flight.
    pub async fn respond<C>(
        &self,
        id: &SessionId,
        message: &str,
        completion: &C,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome, SessionError>
    where
        C: CompletionService + ?Sized,
    {
        let pending = {
            let mut sessions = self.lock_sessions();
            let controller = sessions
                .get_mut(id)
                .ok_or_else(|| SessionError::UnknownSession(id.0.clone()))?;
            controller.submit(message, now)?
        };

        let result = completion.complete(pending.request).await;

        let mut sessions = self.lock_sessions();
        let controller = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownSession(id.0.clone()))?;

        match result {
            Ok(response) => {
                let recorded = controller
                    .record_reply(pending.generation, &response.content, Utc::now())
                    .cloned();
                let reply = match recorded {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(session_id = %id, error = %err, "customer reply discarded");
                        return Err(err);
                    }
                };
                info!(
                    session_id = %id,
                    model = %response.model,
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    "customer replied"
                );
                Ok(TurnOutcome {
                    session_id: id.clone(),
                    scores: pending.scores,
                    customer_reply: Some(reply),
                    model: Some(response.model),
                    usage: Some(response.usage),
                    completion_error: None,
                })
            }
            Err(err) => {
                warn!(
                    session_id = %id,
                    provider = completion.name(),
                    error = %err,
                    "customer reply failed"
                );
                controller.record_failure(pending.generation)?;
                Ok(TurnOutcome {
                    session_id: id.clone(),
                    scores: pending.scores,
                    customer_reply: None,
                    model: None,
                    usage: None,
                    completion_error: Some(err.to_string()),
                })
            }
        }
    }

    /// Drops simulations idle past the timeout. Sessions waiting on a reply are kept.
    fn evict_idle(
        &self,
        sessions: &mut HashMap<SessionId, SessionController>,
        now: DateTime<Utc>,
    ) {
        let cutoff = now - self.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, controller| {
            controller.state() == SessionState::AwaitingModelResponse
                || controller
                    .last_activity()
                    .map_or(true, |last| last >= cutoff)
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle simulations evicted");
        }
    }

    fn resolve_scenario<R: Rng + ?Sized>(
        &self,
        name: Option<&str>,
        rng: &mut R,
    ) -> Result<ScenarioDefinition, SessionError> {
        let scenario = match name {
            Some(name) => self
                .catalog
                .get(name)
                .ok_or_else(|| SessionError::UnknownScenario(name.to_string()))?,
            None => self.catalog.choose(rng).ok_or(SessionError::EmptyCatalog)?,
        };
        Ok(scenario.clone())
    }

    fn next_session_id(&self) -> SessionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("sim-{id:06}"))
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SessionController>> {
        self.sessions.lock().expect("session registry mutex poisoned")
    }
}

fn view_of(id: &SessionId, controller: &SessionController) -> SessionView {
    SessionView {
        session_id: id.clone(),
        state: controller.state(),
        scenario: controller.scenario().cloned(),
        started_at: controller.started_at(),
        latest_scores: controller.latest_scores(),
        transcript: controller.transcript().to_vec(),
    }
}
