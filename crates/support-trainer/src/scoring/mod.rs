//! Lexical "soft score" for trainee replies.
//!
//! Scores are computed locally from keyword matches and elapsed time so the trainee gets
//! feedback without waiting for the language-model round-trip.

mod config;
mod rules;

pub use config::{
    Adjustment, LexiconCategory, ScoringConfig, ScoringConfigError, ShortMessageRule,
    SpeedCurve,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stateless scorer that applies a [`ScoringConfig`] to a single message.
#[derive(Debug, Clone)]
pub struct ResponseScorer {
    config: ScoringConfig,
}

impl ResponseScorer {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        Ok(Self {
            config: config.normalized()?,
        })
    }

    pub fn standard() -> Self {
        Self {
            config: ScoringConfig::standard(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, message: &str, elapsed_seconds: f64) -> ScoreSet {
        self.explain(message, elapsed_seconds).scores
    }

    /// Same as [`ResponseScorer::score`] but keeps every contribution for audits.
    pub fn explain(&self, message: &str, elapsed_seconds: f64) -> ScoreReport {
        let (scores, components) = rules::score_message(message, elapsed_seconds, &self.config);
        debug!(
            empathy = scores.empathy,
            professionalism = scores.professionalism,
            speed = scores.speed,
            matches = components.len(),
            "scored trainee message"
        );
        ScoreReport { scores, components }
    }
}

impl Default for ResponseScorer {
    fn default() -> Self {
        Self::standard()
    }
}

/// Performance snapshot for the trainee's latest message. Every field is in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub empathy: f64,
    pub professionalism: f64,
    pub speed: f64,
}

impl ScoreSet {
    /// Unweighted mean of the three dimensions.
    pub fn overall(&self) -> f64 {
        (self.empathy + self.professionalism + self.speed) / 3.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    Empathy,
    Professionalism,
    Speed,
}

/// Discrete contribution to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: ScoreDimension,
    pub delta: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub scores: ScoreSet,
    pub components: Vec<ScoreComponent>,
}
