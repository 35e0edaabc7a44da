//! `cohort convert` - track a conversion event

use anyhow::Result;
use clap::Args;
use cohort_core::{CohortClient, CohortConfig, DEFAULT_CONVERSION_TYPE};

#[derive(Args)]
pub struct ConvertArgs {
    /// Experiment the conversion belongs to
    pub experiment_id: String,

    /// Conversion type label
    #[arg(long = "type", default_value = DEFAULT_CONVERSION_TYPE)]
    pub conversion_type: String,

    /// Value attributed to the conversion
    #[arg(long, default_value_t = 1.0)]
    pub value: f64,

    /// Suppress duplicate sends for the same experiment and type in this run
    #[arg(long)]
    pub once: bool,
}

pub async fn run(args: ConvertArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;

    let sent = if args.once {
        client
            .track_conversion_once(&args.experiment_id, &args.conversion_type, args.value)
            .await
    } else {
        client
            .track_conversion(&args.experiment_id, &args.conversion_type, args.value)
            .await
    };

    if sent {
        println!("conversion recorded");
    } else {
        let pending = client.store().failed_conversions().await.len();
        println!("conversion queued for retry ({pending} pending)");
    }
    Ok(())
}
