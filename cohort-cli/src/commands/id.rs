//! `cohort id` - show or refresh the stable user id

use anyhow::Result;
use clap::Args;
use cohort_core::{CohortClient, CohortConfig, identity};

#[derive(Args)]
pub struct IdArgs {
    /// Re-derive the id from the current host fingerprint and persist it
    #[arg(long)]
    pub regenerate: bool,
}

pub async fn run(args: IdArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;

    if args.regenerate {
        let id = identity::derive_user_id();
        client.store().set_user_id(&id).await?;
        println!("{id}");
    } else {
        println!("{}", client.user_id());
    }
    Ok(())
}
