//! `cohort retry` - re-send queued failed conversions

use anyhow::Result;
use clap::Args;
use cohort_core::{CohortClient, CohortConfig};

#[derive(Args)]
pub struct RetryArgs {}

pub async fn run(_args: RetryArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;

    let recovered = client.retry_failed_conversions().await;
    let pending = client.store().failed_conversions().await.len();
    println!("recovered {recovered} conversions, {pending} still queued");
    Ok(())
}
