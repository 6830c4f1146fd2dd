//! Role-play simulations: scenario catalog, per-session state machine, and the registry
//! that sequences scoring ahead of the completion call.

mod controller;
mod registry;
mod scenario;
mod timer;

pub use controller::{PendingTurn, Sender, SessionController, SessionState, TranscriptEntry};
pub use registry::{SessionId, SessionRegistry, SessionView, TurnOutcome};
pub use scenario::{ScenarioCatalog, ScenarioDefinition};
pub use timer::SessionTimer;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("simulation has not been started")]
    NotStarted,
    #[error("still waiting for the customer's reply")]
    AwaitingReply,
    #[error("no customer reply is pending")]
    NotAwaitingReply,
    #[error("simulation was restarted before the customer replied")]
    Superseded,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("unknown session '{0}'")]
    UnknownSession(String),
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
    #[error("scenario catalog is empty")]
    EmptyCatalog,
}
