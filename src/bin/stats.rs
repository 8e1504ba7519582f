//! Dataset summary: table shape, tag statistics, and popularity range.

use mireval::{dataset::load_dataset, eval::PopularityRange, Config};
use std::collections::HashSet;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let loaded = load_dataset(&config.dataset, &config.systems)?;
    let table = &loaded.table;

    println!("\n=== Candidate Table ===\n");
    println!("{:-<52}", "");
    println!("{:<30} {:>20}", "Tracks", table.len());
    println!(
        "{:<30} {:>20}",
        "Numeric columns",
        table.numeric_column_names().count()
    );
    println!("{:-<52}", "");

    let tag_maps = table.tag_maps(&config.dataset.tags_column)?;
    let mut distinct_tags: HashSet<&str> = HashSet::new();
    let mut total_instances = 0usize;
    let mut qualifying_instances = 0usize;
    let mut untagged = 0usize;
    for tags in tag_maps {
        if tags.is_empty() {
            untagged += 1;
        }
        for (tag, &weight) in tags {
            distinct_tags.insert(tag.as_str());
            total_instances += 1;
            if weight >= config.evaluation.weight_threshold {
                qualifying_instances += 1;
            }
        }
    }
    let mean_tags = if table.is_empty() {
        0.0
    } else {
        total_instances as f64 / table.len() as f64
    };

    println!("\n=== Tags ({}) ===\n", config.dataset.tags_column);
    println!("{:-<52}", "");
    println!("{:<30} {:>20}", "Distinct tags", distinct_tags.len());
    println!("{:<30} {:>20}", "Tag instances", total_instances);
    println!(
        "{:<30} {:>20}",
        format!("Instances >= {}", config.evaluation.weight_threshold),
        qualifying_instances
    );
    println!("{:<30} {:>20.2}", "Mean tags per track", mean_tags);
    println!("{:<30} {:>20}", "Untagged tracks", untagged);
    println!("{:-<52}", "");

    let popularity = table.numeric_column(&config.dataset.popularity_column)?;
    let range = PopularityRange::from_column(popularity);
    let mean = popularity.iter().sum::<f64>() / popularity.len().max(1) as f64;

    println!("\n=== Popularity ({}) ===\n", config.dataset.popularity_column);
    println!("{:-<52}", "");
    println!("{:<30} {:>20.1}", "Min", range.min);
    println!("{:<30} {:>20.1}", "Max", range.max);
    println!("{:<30} {:>20.1}", "Mean", mean);
    println!("{:-<52}", "");

    println!("\n=== Systems ===\n");
    println!("{:-<52}", "");
    for system in &loaded.systems {
        match &system.feature_columns {
            Some(columns) => {
                println!("{:<30} {:>12} columns", system.name, columns.len())
            }
            None => println!("{:<30} {:>20}", system.name, "random baseline"),
        }
    }
    println!("{:-<52}", "");
    println!();

    Ok(())
}
