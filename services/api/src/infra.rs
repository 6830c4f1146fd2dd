use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use support_trainer::config::{CompletionConfig, ScoringSource};
use support_trainer::error::AppError;
use support_trainer::knowledge::KnowledgeImporter;
use support_trainer::llm::{
    CompletionFuture, CompletionRequest, CompletionService, HttpCompletionService, LlmError,
};
use support_trainer::scoring::{ResponseScorer, ScoringConfig};
use support_trainer::session::{ScenarioCatalog, SessionRegistry};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared handles for the trainer routes.
#[derive(Clone)]
pub(crate) struct TrainerState {
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) completion: Arc<dyn CompletionService>,
    pub(crate) knowledge: Arc<KnowledgeImporter>,
}

impl TrainerState {
    pub(crate) fn new(scorer: ResponseScorer, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(
                Arc::new(scorer),
                ScenarioCatalog::standard(),
            )),
            completion,
            knowledge: Arc::new(KnowledgeImporter::default()),
        }
    }
}

/// Stand-in used when no API key is configured; every turn is still scored.
pub(crate) struct UnconfiguredCompletion {
    reason: String,
}

impl CompletionService for UnconfiguredCompletion {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn complete(&self, _request: CompletionRequest) -> CompletionFuture<'_> {
        let reason = self.reason.clone();
        Box::pin(async move { Err(LlmError::NotConfigured(reason)) })
    }
}

pub(crate) fn load_scorer(source: &ScoringSource) -> Result<ResponseScorer, AppError> {
    match &source.lexicon_path {
        Some(path) => {
            let config = ScoringConfig::from_path(path)?;
            info!(path = %path.display(), "loaded scoring lexicons");
            Ok(ResponseScorer::new(config)?)
        }
        None => Ok(ResponseScorer::standard()),
    }
}

pub(crate) fn completion_service(config: &CompletionConfig) -> Arc<dyn CompletionService> {
    match HttpCompletionService::from_config(config) {
        Ok(service) => {
            info!(endpoint = service.endpoint(), model = %config.model, "completion service ready");
            Arc::new(service)
        }
        Err(err) => {
            warn!(error = %err, "customer replies disabled");
            Arc::new(UnconfiguredCompletion {
                reason: err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_trainer::llm::{ChatMessage, Role};

    #[tokio::test]
    async fn missing_api_key_falls_back_to_unconfigured_service() {
        let service = completion_service(&CompletionConfig::default());
        assert_eq!(service.name(), "unconfigured");

        let result = service
            .complete(CompletionRequest {
                messages: vec![ChatMessage::new(Role::User, "Здравствуйте")],
            })
            .await;
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn default_scoring_source_uses_standard_lexicons() {
        let scorer = load_scorer(&ScoringSource::default()).expect("standard scorer");
        assert_eq!(scorer.config(), ResponseScorer::standard().config());
    }

    #[test]
    fn missing_lexicon_file_is_an_error() {
        let source = ScoringSource {
            lexicon_path: Some("./no-such-lexicons.json".into()),
        };
        assert!(matches!(load_scorer(&source), Err(AppError::Scoring(_))));
    }
}
