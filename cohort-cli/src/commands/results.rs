//! `cohort results` - show aggregated results for an experiment

use anyhow::Result;
use clap::Args;
use cohort_core::{CohortClient, CohortConfig, ExperimentResults};
use comfy_table::Table;

#[derive(Args)]
pub struct ResultsArgs {
    /// Experiment to fetch results for
    pub experiment_id: String,
}

pub async fn run(args: ResultsArgs, config: CohortConfig) -> Result<()> {
    let client = CohortClient::new(config).await?;
    let results = client.results(&args.experiment_id).await?;
    print!("{}", render(&results));
    Ok(())
}

fn render(results: &ExperimentResults) -> String {
    let mut out = format!(
        "{}: {} assignments, {} conversions\n",
        results.experiment_name, results.total_assignments, results.total_conversions
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Variant",
        "Assignments",
        "Conversions",
        "Rate",
        "Total value",
        "Avg value",
    ]);
    for (variant, stats) in &results.results {
        table.add_row(vec![
            variant.clone(),
            stats.assignments.to_string(),
            stats.conversions.to_string(),
            format!("{:.2}%", stats.conversion_rate),
            format!("{:.2}", stats.total_value),
            format!("{:.2}", stats.avg_value),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');
    out
}
