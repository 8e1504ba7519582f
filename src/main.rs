//! Evaluation CLI: run every configured retrieval system over a query batch
//! and report averaged accuracy plus the trade-off comparison table.

use clap::Parser;
use mireval::{
    dataset::load_dataset,
    eval::{evaluate_tradeoffs, render_tradeoff_table, run_evaluations},
    Config,
};
use std::path::PathBuf;

/// Trade-off evaluation: accuracy and beyond-accuracy metrics per system.
#[derive(Parser, Debug)]
#[command(name = "mireval")]
struct Args {
    /// Path to query indices JSON (default: queries.json).
    #[arg(long, default_value = "queries.json")]
    queries: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let metrics = config.evaluation.similarity_metrics()?;
    let opts = config.evaluation.options();

    let loaded = load_dataset(&config.dataset, &config.systems)?;
    let table = &loaded.table;

    let queries_json = std::fs::read_to_string(&args.queries)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.queries.display(), e))?;
    let query_rows: Vec<usize> = serde_json::from_str(&queries_json)
        .map_err(|e| anyhow::anyhow!("Invalid queries JSON: {}", e))?;

    if query_rows.is_empty() {
        anyhow::bail!("No queries in {}", args.queries.display());
    }
    for &row in &query_rows {
        if row >= table.len() {
            anyhow::bail!(
                "Query index {} out of range for table of {} tracks",
                row,
                table.len()
            );
        }
    }

    println!(
        "Running evaluation on {} queries across {} systems\n",
        query_rows.len(),
        loaded.systems.len()
    );

    // Averaged accuracy per similarity system; MRR is reported here only
    for system in &loaded.systems {
        if let Some(columns) = &system.feature_columns {
            let results = run_evaluations(
                table,
                &query_rows,
                columns,
                &metrics,
                &config.dataset.tags_column,
                &opts,
            )?;
            println!("=== {} ===", system.name);
            for (metric, scores) in &results {
                println!(
                    "  {:<10} P@{}: {:.4}  R@{}: {:.4}  NDCG@{}: {:.4}  MRR: {:.4}",
                    metric,
                    opts.top_n,
                    scores.precision,
                    opts.top_n,
                    scores.recall,
                    opts.top_n,
                    scores.ndcg,
                    scores.mrr
                );
            }
            println!();
        }
    }

    let rows = evaluate_tradeoffs(
        table,
        &query_rows,
        &loaded.systems,
        &metrics,
        &config.dataset.tags_column,
        &config.dataset.popularity_column,
        &opts,
    )?;

    println!("=== Trade-off Comparison ===");
    print!("{}", render_tradeoff_table(&rows, opts.top_n));

    Ok(())
}
