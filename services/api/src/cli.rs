use crate::report::{run_knowledge, run_scenarios, run_score, KnowledgeArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use support_trainer::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Support Trainer",
    about = "Score support replies and run customer role-play simulations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single trainee reply
    Score(ScoreArgs),
    /// List the role-play scenarios
    Scenarios,
    /// Mine products, problems and solutions from a dialog export
    Knowledge(KnowledgeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Scenarios => {
            run_scenarios();
            Ok(())
        }
        Command::Knowledge(args) => run_knowledge(args).await,
    }
}
