use crate::assess::{run_assessment, run_model_report, AssessArgs, ModelsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ecolca::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "EcoLCA",
    about = "Serve and run aluminum and copper recycling assessments from the command line",
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
    /// Assess a single submission read from a JSON file
    Assess(AssessArgs),
    /// Show which model artifacts are available per material
    Models(ModelsArgs),
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
        Command::Assess(args) => run_assessment(args).await,
        Command::Models(args) => run_model_report(args),
    }
}
