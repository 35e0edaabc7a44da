use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "cohort", about = "A/B experiment assignment and conversion tracking")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the experiments API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the assigned variant for an experiment
    Variant(commands::variant::VariantArgs),
    /// Track a conversion event
    Convert(commands::convert::ConvertArgs),
    /// Retry conversions that previously failed to send
    Retry(commands::retry::RetryArgs),
    /// Manage experiments
    Experiments(commands::experiments::ExperimentsArgs),
    /// Show aggregated results for an experiment
    Results(commands::results::ResultsArgs),
    /// Show the stable user id
    Id(commands::id::IdArgs),
    /// Clear locally stored assignments and conversions
    Clear(commands::clear::ClearArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::ConfigLoader::load(cli.api_url)?;
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    match cli.command {
        Commands::Variant(args) => commands::variant::run(args, config).await,
        Commands::Convert(args) => commands::convert::run(args, config).await,
        Commands::Retry(args) => commands::retry::run(args, config).await,
        Commands::Experiments(args) => commands::experiments::run(args, config).await,
        Commands::Results(args) => commands::results::run(args, config).await,
        Commands::Id(args) => commands::id::run(args, config).await,
        Commands::Clear(args) => commands::clear::run(args, config).await,
    }
}
