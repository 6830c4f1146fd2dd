use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Keyword families the scorer looks for in a trainee message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexiconCategory {
    Empathy,
    Professionalism,
    Rudeness,
}

impl LexiconCategory {
    pub fn label(self) -> &'static str {
        match self {
            LexiconCategory::Empathy => "empathy",
            LexiconCategory::Professionalism => "professionalism",
            LexiconCategory::Rudeness => "rudeness",
        }
    }
}

/// Per-match deltas a lexicon category applies to the keyword-driven dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Adjustment {
    #[serde(default)]
    pub empathy: f64,
    #[serde(default)]
    pub professionalism: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortMessageRule {
    /// Messages with fewer characters than this are penalized.
    pub threshold_chars: usize,
    pub professionalism_penalty: f64,
}

/// Linear decay of the speed score over elapsed minutes, floored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedCurve {
    pub ceiling: f64,
    pub decay_per_minute: f64,
    pub floor: f64,
}

impl SpeedCurve {
    pub fn at(&self, elapsed_seconds: f64) -> f64 {
        let elapsed = if elapsed_seconds.is_nan() || elapsed_seconds < 0.0 {
            0.0
        } else {
            elapsed_seconds
        };
        (self.ceiling - (elapsed / 60.0) * self.decay_per_minute).max(self.floor)
    }
}

/// Tuning data for [`super::ResponseScorer`]: lexicons, weights, and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub baseline: f64,
    pub lexicons: BTreeMap<LexiconCategory, Vec<String>>,
    pub weights: BTreeMap<LexiconCategory, Adjustment>,
    pub short_message: ShortMessageRule,
    pub speed: SpeedCurve,
}

impl ScoringConfig {
    /// Built-in tuning for Russian-language support conversations.
    pub fn standard() -> Self {
        let mut lexicons = BTreeMap::new();
        lexicons.insert(
            LexiconCategory::Empathy,
            terms(&[
                "извините",
                "понимаю",
                "сожалению",
                "помогу",
                "спасибо за терпение",
            ]),
        );
        lexicons.insert(
            LexiconCategory::Professionalism,
            terms(&[
                "заказ",
                "доставк",
                "возврат",
                "статус",
                "трек-номер",
                "компенсац",
            ]),
        );
        lexicons.insert(
            LexiconCategory::Rudeness,
            terms(&[
                "не моя проблема",
                "сами виноваты",
                "читайте внимательнее",
                "ничего не могу сделать",
            ]),
        );

        let mut weights = BTreeMap::new();
        weights.insert(
            LexiconCategory::Empathy,
            Adjustment {
                empathy: 15.0,
                professionalism: 0.0,
            },
        );
        weights.insert(
            LexiconCategory::Professionalism,
            Adjustment {
                empathy: 0.0,
                professionalism: 12.0,
            },
        );
        weights.insert(
            LexiconCategory::Rudeness,
            Adjustment {
                empathy: -30.0,
                professionalism: -20.0,
            },
        );

        Self {
            baseline: 50.0,
            lexicons,
            weights,
            short_message: ShortMessageRule {
                threshold_chars: 20,
                professionalism_penalty: 10.0,
            },
            speed: SpeedCurve {
                ceiling: 100.0,
                decay_per_minute: 20.0,
                floor: 30.0,
            },
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoringConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoringConfigError> {
        let config: ScoringConfig = serde_json::from_reader(reader)?;
        config.normalized()
    }

    /// Validates the tuning data and lowercases every term so matching stays
    /// case-insensitive.
    pub fn normalized(mut self) -> Result<Self, ScoringConfigError> {
        if !self.baseline.is_finite() {
            return Err(ScoringConfigError::NonFinite("baseline"));
        }
        if !(self.short_message.professionalism_penalty.is_finite()
            && self.speed.ceiling.is_finite()
            && self.speed.decay_per_minute.is_finite()
            && self.speed.floor.is_finite())
        {
            return Err(ScoringConfigError::NonFinite("thresholds"));
        }
        if self.speed.floor > self.speed.ceiling {
            return Err(ScoringConfigError::InvertedSpeedCurve {
                floor: self.speed.floor,
                ceiling: self.speed.ceiling,
            });
        }

        for (category, weight) in &self.weights {
            if !(weight.empathy.is_finite() && weight.professionalism.is_finite()) {
                return Err(ScoringConfigError::NonFinite(category.label()));
            }
        }

        for (category, list) in self.lexicons.iter_mut() {
            for term in list.iter_mut() {
                let lowered = term.trim().to_lowercase();
                if lowered.is_empty() {
                    return Err(ScoringConfigError::EmptyTerm(*category));
                }
                *term = lowered;
            }
            list.sort();
            list.dedup();
        }

        Ok(self)
    }

    pub(crate) fn weight(&self, category: LexiconCategory) -> Adjustment {
        self.weights.get(&category).copied().unwrap_or_default()
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::standard()
    }
}

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("failed to read scoring config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("speed floor {floor} exceeds ceiling {ceiling}")]
    InvertedSpeedCurve { floor: f64, ceiling: f64 },
    #[error("{} lexicon contains an empty term", .0.label())]
    EmptyTerm(LexiconCategory),
}
