use super::scenario::ScenarioDefinition;
use super::timer::SessionTimer;
use super::SessionError;
use crate::llm::{ChatMessage, CompletionRequest, Role};
use crate::scoring::{ResponseScorer, ScoreSet};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingUserInput,
    AwaitingModelResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Customer,
    Trainee,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub id: u32,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
}

/// Output of [`SessionController::submit`]: immediate feedback plus the request that will
/// produce the customer's next line.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    pub scores: ScoreSet,
    pub request: CompletionRequest,
    /// Simulation the turn belongs to; replies for an older generation are discarded.
    pub generation: u64,
}

/// Drives one simulated conversation. Scoring happens synchronously on submit; the
/// completion call is the caller's job and is reported back through
/// [`SessionController::record_reply`] or [`SessionController::record_failure`].
#[derive(Debug, Clone)]
pub struct SessionController {
    scorer: Arc<ResponseScorer>,
    scenario: Option<ScenarioDefinition>,
    timer: Option<SessionTimer>,
    transcript: Vec<TranscriptEntry>,
    latest_scores: Option<ScoreSet>,
    state: SessionState,
    generation: u64,
    last_activity: Option<DateTime<Utc>>,
}

impl SessionController {
    pub fn new(scorer: Arc<ResponseScorer>) -> Self {
        Self {
            scorer,
            scenario: None,
            timer: None,
            transcript: Vec::new(),
            latest_scores: None,
            state: SessionState::Idle,
            generation: 0,
            last_activity: None,
        }
    }

    /// Begins (or restarts) a simulation. Resets the timer and transcript and starts a new
    /// generation, so a reply still in flight for the previous one is never recorded.
    pub fn start(&mut self, scenario: ScenarioDefinition, now: DateTime<Utc>) {
        self.generation += 1;
        self.last_activity = Some(now);
        self.timer = Some(SessionTimer::start(now));
        self.transcript.clear();
        self.latest_scores = None;
        self.push_entry(Sender::Customer, scenario.opening_message.to_string(), now);
        self.scenario = Some(scenario);
        self.state = SessionState::AwaitingUserInput;
    }

    pub fn submit(
        &mut self,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingTurn, SessionError> {
        match self.state {
            SessionState::Idle => return Err(SessionError::NotStarted),
            SessionState::AwaitingModelResponse => return Err(SessionError::AwaitingReply),
            SessionState::AwaitingUserInput => {}
        }
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let elapsed = self
            .timer
            .map(|timer| timer.elapsed_seconds(now))
            .unwrap_or_default();
        let scores = self.scorer.score(message, elapsed);
        self.latest_scores = Some(scores);
        self.last_activity = Some(now);
        self.push_entry(Sender::Trainee, message.to_string(), now);
        self.state = SessionState::AwaitingModelResponse;

        Ok(PendingTurn {
            scores,
            request: self.completion_request(),
            generation: self.generation,
        })
    }

    pub fn record_reply(
        &mut self,
        generation: u64,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<&TranscriptEntry, SessionError> {
        self.ensure_pending(generation)?;
        self.last_activity = Some(now);
        self.push_entry(Sender::Customer, reply.trim().to_string(), now);
        self.state = SessionState::AwaitingUserInput;
        self.transcript.last().ok_or(SessionError::NotStarted)
    }

    /// The completion call failed; hand the turn back to the trainee.
    pub fn record_failure(&mut self, generation: u64) -> Result<(), SessionError> {
        self.ensure_pending(generation)?;
        self.state = SessionState::AwaitingUserInput;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scenario(&self) -> Option<&ScenarioDefinition> {
        self.scenario.as_ref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn latest_scores(&self) -> Option<ScoreSet> {
        self.latest_scores
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timer.map(|timer| timer.started_at())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time of the last start, trainee message, or recorded reply.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    fn ensure_pending(&self, generation: u64) -> Result<(), SessionError> {
        if generation != self.generation {
            return Err(SessionError::Superseded);
        }
        if self.state != SessionState::AwaitingModelResponse {
            return Err(SessionError::NotAwaitingReply);
        }
        Ok(())
    }

    fn completion_request(&self) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        if let Some(scenario) = &self.scenario {
            messages.push(ChatMessage::new(Role::System, scenario.persona_prompt()));
        }
        messages.extend(self.transcript.iter().map(|entry| {
            let role = match entry.sender {
                Sender::Customer => Role::Assistant,
                Sender::Trainee => Role::User,
            };
            ChatMessage::new(role, entry.text.clone())
        }));
        CompletionRequest { messages }
    }

    fn push_entry(&mut self, sender: Sender, text: String, now: DateTime<Utc>) {
        let id = self.transcript.len() as u32 + 1;
        self.transcript.push(TranscriptEntry {
            id,
            sender,
            text,
            sent_at: now,
            time: now.with_timezone(&Local).format("%H:%M").to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScenarioCatalog;
    use chrono::Duration;

    fn controller() -> SessionController {
        SessionController::new(Arc::new(ResponseScorer::standard()))
    }

    fn scenario() -> ScenarioDefinition {
        ScenarioCatalog::standard()
            .get("delayed_delivery")
            .cloned()
            .expect("scenario exists")
    }

    #[test]
    fn new_controller_is_idle_and_rejects_messages() {
        let mut controller = controller();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(matches!(
            controller.submit("Здравствуйте", Utc::now()),
            Err(SessionError::NotStarted)
        ));
    }

    #[test]
    fn start_seeds_opening_message() {
        let mut controller = controller();
        let now = Utc::now();
        controller.start(scenario(), now);

        assert_eq!(controller.state(), SessionState::AwaitingUserInput);
        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].sender, Sender::Customer);
        assert_eq!(transcript[0].text, scenario().opening_message);
        assert_eq!(transcript[0].time.len(), 5);
        assert_eq!(&transcript[0].time[2..3], ":");
    }

    #[test]
    fn submit_scores_against_session_start_and_builds_request() {
        let mut controller = controller();
        let start = Utc::now();
        controller.start(scenario(), start);

        let turn = controller
            .submit(
                "Извините за ожидание, сейчас проверю статус заказа.",
                start + Duration::seconds(90),
            )
            .expect("turn accepted");

        assert_eq!(turn.scores.speed, 70.0);
        assert_eq!(turn.scores.empathy, 65.0);
        assert_eq!(turn.scores.professionalism, 74.0);
        assert_eq!(controller.state(), SessionState::AwaitingModelResponse);
        assert_eq!(controller.latest_scores(), Some(turn.scores));

        let roles: Vec<Role> = turn.request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User]);
        assert!(turn.request.messages[0]
            .content
            .contains(scenario().system_instruction));
    }

    #[test]
    fn blank_message_is_rejected_without_state_change() {
        let mut controller = controller();
        controller.start(scenario(), Utc::now());
        assert!(matches!(
            controller.submit("   ", Utc::now()),
            Err(SessionError::EmptyMessage)
        ));
        assert_eq!(controller.state(), SessionState::AwaitingUserInput);
        assert_eq!(controller.transcript().len(), 1);
    }

    #[test]
    fn second_submit_waits_for_reply() {
        let mut controller = controller();
        let now = Utc::now();
        controller.start(scenario(), now);
        let turn = controller
            .submit("Одну минуту, уточняю.", now)
            .expect("first turn");
        assert!(matches!(
            controller.submit("Ещё сообщение", now),
            Err(SessionError::AwaitingReply)
        ));

        let reply = controller
            .record_reply(turn.generation, "  Хорошо, жду.  ", now)
            .expect("reply recorded");
        assert_eq!(reply.text, "Хорошо, жду.");
        assert_eq!(reply.id, 3);
        assert_eq!(controller.state(), SessionState::AwaitingUserInput);
    }

    #[test]
    fn failure_returns_turn_to_trainee() {
        let mut controller = controller();
        let now = Utc::now();
        controller.start(scenario(), now);
        assert!(matches!(
            controller.record_failure(controller.generation()),
            Err(SessionError::NotAwaitingReply)
        ));
        let turn = controller.submit("Проверяю ваш заказ.", now).expect("turn");
        controller
            .record_failure(turn.generation)
            .expect("failure recorded");
        assert_eq!(controller.state(), SessionState::AwaitingUserInput);
        assert_eq!(controller.transcript().len(), 2);
    }

    #[test]
    fn restart_resets_timer_and_transcript() {
        let mut controller = controller();
        let start = Utc::now();
        controller.start(scenario(), start);
        controller
            .submit("Проверяю ваш заказ.", start + Duration::minutes(4))
            .expect("turn");

        let restart = start + Duration::minutes(10);
        controller.start(scenario(), restart);
        assert_eq!(controller.transcript().len(), 1);
        assert!(controller.latest_scores().is_none());
        assert_eq!(controller.started_at(), Some(restart));

        let turn = controller
            .submit("Проверяю ваш заказ.", restart)
            .expect("turn");
        assert_eq!(turn.scores.speed, 100.0);
    }

    #[test]
    fn reply_for_previous_simulation_is_discarded() {
        let mut controller = controller();
        let start = Utc::now();
        controller.start(scenario(), start);
        let stale = controller
            .submit("Проверяю ваш заказ.", start)
            .expect("first simulation turn");

        controller.start(scenario(), start + Duration::minutes(1));
        let current = controller
            .submit("Извините, уточняю статус доставки.", start + Duration::minutes(1))
            .expect("second simulation turn");
        assert_ne!(stale.generation, current.generation);

        assert!(matches!(
            controller.record_reply(stale.generation, "Где мой бинокль?", start),
            Err(SessionError::Superseded)
        ));
        assert!(matches!(
            controller.record_failure(stale.generation),
            Err(SessionError::Superseded)
        ));
        assert_eq!(controller.state(), SessionState::AwaitingModelResponse);
        assert_eq!(controller.transcript().len(), 2);

        controller
            .record_reply(current.generation, "Спасибо, жду.", start)
            .expect("current reply recorded");
        assert_eq!(controller.transcript().len(), 3);
    }

    #[test]
    fn activity_tracks_latest_interaction() {
        let mut controller = controller();
        assert_eq!(controller.last_activity(), None);
        let start = Utc::now();
        controller.start(scenario(), start);
        assert_eq!(controller.last_activity(), Some(start));
        let later = start + Duration::seconds(40);
        controller.submit("Проверяю ваш заказ.", later).expect("turn");
        assert_eq!(controller.last_activity(), Some(later));
    }
}
