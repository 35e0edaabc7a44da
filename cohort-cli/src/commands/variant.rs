//! `cohort variant` - get the assigned variant for an experiment

use anyhow::Result;
use clap::Args;
use cohort_core::{AssignOptions, CohortClient, CohortConfig};

#[derive(Args)]
pub struct VariantArgs {
    /// Experiment id to get an assignment for
    pub experiment_id: String,

    /// Bypass the session cache and re-request from the backend
    #[arg(long)]
    pub force_refresh: bool,
}

pub async fn run(args: VariantArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;
    let options = AssignOptions {
        force_refresh: args.force_refresh,
        ..AssignOptions::default()
    };

    let variant = client.variant(&args.experiment_id, &options).await;
    println!("{variant}");
    Ok(())
}
