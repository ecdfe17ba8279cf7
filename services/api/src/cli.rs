use crate::demo::{run_contractor_report, run_demo, ContractorReportArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use roadwatch::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Roadwatch",
    about = "Contractor rating and risk scoring for road-construction oversight",
    long_about = "Serves the contractor ledger API (contractors, roads, complaints, ratings), \
scores a contractor from road project and complaint CSV exports, or runs a seeded demo. \
The server can also start from a CSV export passed with --seed-projects and --seed-complaints.",
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
    /// Score a contractor from ledger CSV exports
    Contractor {
        #[command(subcommand)]
        command: ContractorCommand,
    },
    /// Seed an in-memory ledger and print detail and dashboard views
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ContractorCommand {
    /// Print the rating, audit trail and risk assessment for one contractor
    Report(ContractorReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) seed: LedgerSeedArgs,
}

/// Ledger export loaded into the in-memory ledger before the listener opens.
#[derive(Args, Debug, Default)]
pub(crate) struct LedgerSeedArgs {
    /// Road project export (Project ID, Road ID, Road Name, Construction Date, Warranty Years)
    #[arg(long, requires = "seed_complaints")]
    pub(crate) seed_projects: Option<PathBuf>,
    /// Complaint export for the seeded projects
    #[arg(long, requires = "seed_projects")]
    pub(crate) seed_complaints: Option<PathBuf>,
    /// Contractor code registered for the seeded projects
    #[arg(long, default_value = "CON-0001")]
    pub(crate) seed_code: String,
    /// Contractor display name registered for the seeded projects
    #[arg(long, default_value = "Seeded contractor")]
    pub(crate) seed_name: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Contractor {
            command: ContractorCommand::Report(args),
        } => run_contractor_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
