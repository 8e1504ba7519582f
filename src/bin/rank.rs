//! Rank the most similar tracks for a single query row.

use clap::Parser;
use mireval::{
    dataset::load_dataset,
    retrieval::{rank_by_similarity, SimilarityMetric},
    Config,
};

/// Retrieve the top-N neighbours of one query track.
#[derive(Parser, Debug)]
#[command(name = "rank")]
struct Args {
    /// Row index of the query track.
    query: usize,

    /// System whose feature columns to rank with (default: the first
    /// configured similarity system).
    #[arg(long)]
    system: Option<String>,

    /// Similarity metric ('cosine' or 'euclidean').
    #[arg(long, default_value = "cosine")]
    metric: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load()?;
    let metric: SimilarityMetric = args.metric.parse()?;

    let loaded = load_dataset(&config.dataset, &config.systems)?;
    let table = &loaded.table;

    let system = match &args.system {
        Some(name) => loaded
            .systems
            .iter()
            .find(|s| s.name == *name)
            .ok_or_else(|| anyhow::anyhow!("Unknown system: {}", name))?,
        None => loaded
            .systems
            .iter()
            .find(|s| !s.is_baseline())
            .ok_or_else(|| anyhow::anyhow!("No similarity system configured"))?,
    };
    let columns = system.feature_columns.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "System '{}' is the random baseline; pick a similarity system",
            system.name
        )
    })?;

    let ranked = rank_by_similarity(table, args.query, columns, metric, config.evaluation.top_n)?;

    println!(
        "\nTop {} matches for '{}' under system '{}' ({}, {} feature columns)\n",
        ranked.len(),
        table.id(args.query),
        system.name,
        metric,
        columns.len()
    );

    let artists = table.text_column("artist");
    let songs = table.text_column("song");

    println!("{:-<72}", "");
    for (rank, result) in ranked.iter().enumerate() {
        let row = table
            .row_of(&result.id)
            .ok_or_else(|| anyhow::anyhow!("Ranked id '{}' not in table", result.id))?;
        let label = match (artists, songs) {
            (Some(artists), Some(songs)) => format!("{} - {}", artists[row], songs[row]),
            _ => result.id.clone(),
        };
        println!("{:>3}. {:<48} (score: {:.4})", rank + 1, label, result.score);
    }
    println!("{:-<72}", "");

    Ok(())
}
