use super::config::{LexiconCategory, ScoringConfig};
use super::{ScoreComponent, ScoreDimension, ScoreSet};

/// Unclamped running totals for the keyword-driven dimensions.
struct RawScores {
    empathy: f64,
    professionalism: f64,
}

pub(crate) fn score_message(
    message: &str,
    elapsed_seconds: f64,
    config: &ScoringConfig,
) -> (ScoreSet, Vec<ScoreComponent>) {
    let lowered = message.to_lowercase();
    let mut components = Vec::new();
    let mut raw = RawScores {
        empathy: config.baseline,
        professionalism: config.baseline,
    };

    for (category, terms) in &config.lexicons {
        let weight = config.weight(*category);
        for term in terms.iter().filter(|term| lowered.contains(term.as_str())) {
            apply_match(
                *category,
                term,
                weight.empathy,
                weight.professionalism,
                &mut raw,
                &mut components,
            );
        }
    }

    let length = message.chars().count();
    if length < config.short_message.threshold_chars {
        let penalty = config.short_message.professionalism_penalty;
        raw.professionalism -= penalty;
        components.push(ScoreComponent {
            dimension: ScoreDimension::Professionalism,
            delta: -penalty,
            notes: format!(
                "message has {length} characters, under the {} character minimum",
                config.short_message.threshold_chars
            ),
        });
    }

    let speed = config.speed.at(elapsed_seconds);
    components.push(ScoreComponent {
        dimension: ScoreDimension::Speed,
        delta: speed - config.speed.ceiling,
        notes: format!("{:.0}s since the simulation started", elapsed_seconds.max(0.0)),
    });

    let scores = ScoreSet {
        empathy: clamp_score(raw.empathy),
        professionalism: clamp_score(raw.professionalism),
        speed: clamp_score(speed),
    };

    (scores, components)
}

fn apply_match(
    category: LexiconCategory,
    term: &str,
    empathy: f64,
    professionalism: f64,
    raw: &mut RawScores,
    components: &mut Vec<ScoreComponent>,
) {
    if empathy != 0.0 {
        raw.empathy += empathy;
        components.push(ScoreComponent {
            dimension: ScoreDimension::Empathy,
            delta: empathy,
            notes: format!("{} term \"{term}\"", category.label()),
        });
    }
    if professionalism != 0.0 {
        raw.professionalism += professionalism;
        components.push(ScoreComponent {
            dimension: ScoreDimension::Professionalism,
            delta: professionalism,
            notes: format!("{} term \"{term}\"", category.label()),
        });
    }
}

pub(crate) fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}
