use crate::infra::load_scorer;
use clap::Args;
use std::path::PathBuf;
use support_trainer::config::AppConfig;
use support_trainer::error::AppError;
use support_trainer::knowledge::{KnowledgeBase, KnowledgeImporter};
use support_trainer::scoring::{ScoreReport, ScoreSet};
use support_trainer::session::ScenarioCatalog;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Trainee reply to score
    pub(crate) message: String,
    /// Seconds since the simulation started
    #[arg(long, default_value_t = 0.0)]
    pub(crate) elapsed_seconds: f64,
    /// Print every contribution to the scores
    #[arg(long)]
    pub(crate) explain: bool,
}

#[derive(Args, Debug)]
pub(crate) struct KnowledgeArgs {
    /// Dialog export in CSV form
    #[arg(long, required_unless_present = "sheet_url", conflicts_with = "sheet_url")]
    pub(crate) csv: Option<PathBuf>,
    /// Public Google Sheets link to download as CSV
    #[arg(long)]
    pub(crate) sheet_url: Option<String>,
    /// Number of entries to print per list
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: usize,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let scorer = load_scorer(&config.scoring)?;
    let report = scorer.explain(&args.message, args.elapsed_seconds);
    render_score(&report, args.explain);
    Ok(())
}

pub(crate) fn run_scenarios() {
    let catalog = ScenarioCatalog::standard();
    println!("Role-play scenarios");
    for scenario in catalog.scenarios() {
        println!("- {} ({})", scenario.title, scenario.name);
        println!("  Opening: {}", scenario.opening_message);
    }
}

pub(crate) async fn run_knowledge(args: KnowledgeArgs) -> Result<(), AppError> {
    let importer = KnowledgeImporter::default();
    let base = match (args.csv, args.sheet_url) {
        (Some(path), _) => importer.import_path(path)?,
        (None, Some(url)) => importer.import_sheet(&url).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "either --csv or --sheet-url is required".to_string(),
            ))
        }
    };
    render_knowledge(&base, args.limit);
    Ok(())
}

fn render_score(report: &ScoreReport, explain: bool) {
    render_score_set(&report.scores);
    if !explain {
        return;
    }
    println!("Contributions:");
    for component in &report.components {
        println!(
            "  - {:?}: {:+.0} ({})",
            component.dimension, component.delta, component.notes
        );
    }
}

fn render_score_set(scores: &ScoreSet) {
    println!("Empathy:         {:>5.1}", scores.empathy);
    println!("Professionalism: {:>5.1}", scores.professionalism);
    println!("Speed:           {:>5.1}", scores.speed);
    println!("Overall:         {:>5.1}", scores.overall());
}

fn render_knowledge(base: &KnowledgeBase, limit: usize) {
    let knowledge = &base.knowledge;
    println!(
        "Processed {} dialogs: {} product mentions, {} problems, {} solutions",
        base.dialogs.len(),
        knowledge.products.len(),
        knowledge.problems.len(),
        knowledge.solutions.len()
    );

    println!("\nProducts");
    for product in knowledge.products.iter().take(limit) {
        println!("  - {product}");
    }

    println!("\nProblems");
    for problem in knowledge.problems.iter().take(limit) {
        println!("  - {problem}");
    }

    println!("\nSolutions");
    for pair in knowledge.solutions.iter().take(limit) {
        println!("  - Q: {}", pair.problem);
        println!("    A: {}", pair.solution);
    }
}
