//! `cohort clear` - wipe all locally stored data

use anyhow::Result;
use clap::Args;
use cohort_core::{CohortConfig, LocalStore};

#[derive(Args)]
pub struct ClearArgs {}

pub async fn run(_args: ClearArgs, config: CohortConfig) -> Result<()> {
    let dir = config.data_dir.unwrap_or_else(cohort_paths::data_dir);
    let store = LocalStore::load(&dir).await?;
    store.clear().await?;
    println!("cleared local cohort data in {}", dir.display());
    Ok(())
}
