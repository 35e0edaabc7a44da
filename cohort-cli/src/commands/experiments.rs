//! `cohort experiments` - list, create and manage experiments

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use cohort_core::{CohortClient, CohortConfig, ExperimentStatus, NewExperiment, TrafficSplit};
use comfy_table::Table;

#[derive(Args)]
pub struct ExperimentsArgs {
    #[command(subcommand)]
    pub command: ExperimentsCommand,
}

#[derive(Subcommand)]
pub enum ExperimentsCommand {
    /// List experiments
    List,
    /// Create a new experiment
    Create(CreateArgs),
    /// Update an experiment's status
    Status(StatusArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Experiment name
    #[arg(long)]
    pub name: String,

    /// Experiment description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Variant names, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub variants: Vec<String>,

    /// Traffic split as variant=percent pairs, comma-separated.
    /// Defaults to an even split over the variants.
    #[arg(long, value_delimiter = ',')]
    pub split: Vec<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Experiment to update
    pub experiment_id: String,

    /// New status: draft, active, paused or completed
    pub status: ExperimentStatus,
}

pub async fn run(args: ExperimentsArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;

    match args.command {
        ExperimentsCommand::List => list(&client).await,
        ExperimentsCommand::Create(args) => create(&client, args).await,
        ExperimentsCommand::Status(args) => status(&client, args).await,
    }
}

async fn list(client: &CohortClient) -> Result<()> {
    let experiments = client.experiments().await?;
    if experiments.is_empty() {
        println!("no experiments");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Status", "Variants", "Split"]);
    for experiment in experiments {
        let split = experiment
            .traffic_split
            .0
            .iter()
            .map(|(variant, percent)| format!("{variant}={percent}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            experiment.id,
            experiment.name,
            experiment.status.to_string(),
            experiment.variants.join(", "),
            split,
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn create(client: &CohortClient, args: CreateArgs) -> Result<()> {
    let mut experiment = NewExperiment::new(args.name, args.description, args.variants);
    if !args.split.is_empty() {
        experiment = experiment.with_split(parse_split(&args.split)?);
    }
    experiment.validate()?;

    let id = client.create_experiment(&experiment).await?;
    println!("created experiment {id}");
    Ok(())
}

async fn status(client: &CohortClient, args: StatusArgs) -> Result<()> {
    client
        .update_experiment_status(&args.experiment_id, args.status)
        .await?;
    println!("experiment {} is now {}", args.experiment_id, args.status);
    Ok(())
}

/// Parse `variant=percent` pairs into a traffic split
fn parse_split(pairs: &[String]) -> Result<TrafficSplit> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let Some((variant, percent)) = pair.split_once('=') else {
            bail!("invalid split entry '{pair}', expected variant=percent");
        };
        let percent: u8 = percent
            .trim()
            .parse()
            .with_context(|| format!("invalid percentage in split entry '{pair}'"))?;
        map.insert(variant.trim().to_string(), percent);
    }
    Ok(TrafficSplit(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_split_pairs() {
        let split = parse_split(&pairs(&["control=50", "variant_a=50"])).unwrap();
        assert_eq!(split.0.get("control"), Some(&50));
        assert_eq!(split.total(), 100);
    }

    #[test]
    fn test_parse_split_rejects_bad_entries() {
        assert!(parse_split(&pairs(&["control"])).is_err());
        assert!(parse_split(&pairs(&["control=many"])).is_err());
        assert!(parse_split(&pairs(&["control=200"])).is_err());
    }
}
