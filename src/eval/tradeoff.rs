//! Evaluation aggregator: runs every configured system and metric over a
//! query batch and assembles the accuracy / beyond-accuracy trade-off table.

use crate::dataset::Table;
use crate::error::{MirevalError, Result};
use crate::eval::accuracy::{score_accuracy, AccuracyScores};
use crate::eval::beyond::{BeyondAccuracyScores, BeyondAccuracyState, PopularityRange};
use crate::eval::relevance;
use crate::retrieval::{RetrievalArm, SimilarityMetric, SystemSpec};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Typed evaluation knobs with the documented defaults.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Size of the ranked result list (top-K cutoff).
    pub top_n: usize,
    /// Minimum tag weight counted by the diversity metric.
    pub weight_threshold: f64,
    /// Seed for the random-baseline permutation.
    pub seed: u64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            weight_threshold: 60.0,
            seed: 42,
        }
    }
}

/// One row of the trade-off comparison table. MRR is intentionally reported
/// only in the averaged accuracy output, not here.
#[derive(Debug, Clone)]
pub struct TradeoffRow {
    pub system: String,
    pub metric: String,
    pub precision: f64,
    pub recall: f64,
    pub ndcg: f64,
    pub diversity: f64,
    pub avg_popularity: f64,
}

/// Rank one query under `arm`, derive its relevant set, and score accuracy.
pub fn evaluate_query(
    table: &Table,
    query_row: usize,
    arm: &RetrievalArm<'_>,
    tags_column: &str,
    opts: &EvalOptions,
) -> Result<AccuracyScores> {
    let ranked = arm.rank(table, query_row, opts.top_n)?;
    let relevant = relevance::relevant_set(table, query_row, tags_column)?;
    Ok(score_accuracy(&ranked, &relevant, opts.top_n))
}

/// Averaged accuracy scores for a query batch under one arm.
fn mean_accuracy(
    table: &Table,
    query_rows: &[usize],
    arm: &RetrievalArm<'_>,
    tags_column: &str,
    opts: &EvalOptions,
) -> Result<AccuracyScores> {
    if query_rows.is_empty() {
        return Err(MirevalError::InvalidInput("query batch is empty".to_string()));
    }

    let mut sum = AccuracyScores::default();
    for &query_row in query_rows {
        let scores = evaluate_query(table, query_row, arm, tags_column, opts)?;
        log::debug!(
            "query {} [{}]: P@{} {:.4}, R@{} {:.4}, NDCG@{} {:.4}, MRR {:.4}",
            query_row,
            arm.label(),
            opts.top_n,
            scores.precision,
            opts.top_n,
            scores.recall,
            opts.top_n,
            scores.ndcg,
            scores.mrr
        );
        sum.precision += scores.precision;
        sum.recall += scores.recall;
        sum.ndcg += scores.ndcg;
        sum.mrr += scores.mrr;
    }

    let count = query_rows.len() as f64;
    Ok(AccuracyScores {
        precision: sum.precision / count,
        recall: sum.recall / count,
        ndcg: sum.ndcg / count,
        mrr: sum.mrr / count,
    })
}

/// Averaged accuracy metrics for each similarity metric over one
/// feature-column subset, keyed by metric name.
pub fn run_evaluations(
    table: &Table,
    query_rows: &[usize],
    feature_columns: &[String],
    metrics: &[SimilarityMetric],
    tags_column: &str,
    opts: &EvalOptions,
) -> Result<BTreeMap<String, AccuracyScores>> {
    let mut results = BTreeMap::new();
    for &metric in metrics {
        let arm = RetrievalArm::Similarity {
            feature_columns,
            metric,
        };
        results.insert(metric.name().to_string(), mean_accuracy(table, query_rows, &arm, tags_column, opts)?);
    }
    Ok(results)
}

/// Beyond-accuracy scores for a query batch under one arm. The popularity
/// normalization range is computed once from the whole table.
pub fn beyond_accuracy(
    table: &Table,
    query_rows: &[usize],
    arm: &RetrievalArm<'_>,
    tags_column: &str,
    popularity_column: &str,
    opts: &EvalOptions,
) -> Result<BeyondAccuracyScores> {
    if query_rows.is_empty() {
        return Err(MirevalError::InvalidInput("query batch is empty".to_string()));
    }

    let range = PopularityRange::from_column(table.numeric_column(popularity_column)?);
    let mut state = BeyondAccuracyState::new();
    for &query_row in query_rows {
        let ranked = arm.rank(table, query_row, opts.top_n)?;
        state.observe(table, &ranked, tags_column, popularity_column, opts.weight_threshold, &range)?;
    }
    Ok(state.finalize(table.len()))
}

/// Evaluate every system/metric pair over the query batch and assemble the
/// trade-off comparison rows. Baseline systems contribute a single row with
/// the metric label "random".
pub fn evaluate_tradeoffs(
    table: &Table,
    query_rows: &[usize],
    systems: &[SystemSpec],
    metrics: &[SimilarityMetric],
    tags_column: &str,
    popularity_column: &str,
    opts: &EvalOptions,
) -> Result<Vec<TradeoffRow>> {
    let mut rows = Vec::new();

    for system in systems {
        match &system.feature_columns {
            None => {
                log::info!("evaluating system '{}' (random baseline)", system.name);
                let arm = RetrievalArm::RandomBaseline { seed: opts.seed };
                let accuracy = mean_accuracy(table, query_rows, &arm, tags_column, opts)?;
                let beyond =
                    beyond_accuracy(table, query_rows, &arm, tags_column, popularity_column, opts)?;
                rows.push(TradeoffRow {
                    system: system.name.clone(),
                    metric: "random".to_string(),
                    precision: accuracy.precision,
                    recall: accuracy.recall,
                    ndcg: accuracy.ndcg,
                    diversity: beyond.diversity,
                    avg_popularity: beyond.avg_popularity,
                });
            }
            Some(feature_columns) => {
                for &metric in metrics {
                    log::info!("evaluating system '{}' with {}", system.name, metric);
                    let arm = RetrievalArm::Similarity {
                        feature_columns,
                        metric,
                    };
                    let accuracy = mean_accuracy(table, query_rows, &arm, tags_column, opts)?;
                    let beyond = beyond_accuracy(
                        table,
                        query_rows,
                        &arm,
                        tags_column,
                        popularity_column,
                        opts,
                    )?;
                    rows.push(TradeoffRow {
                        system: system.name.clone(),
                        metric: metric.name().to_string(),
                        precision: accuracy.precision,
                        recall: accuracy.recall,
                        ndcg: accuracy.ndcg,
                        diversity: beyond.diversity,
                        avg_popularity: beyond.avg_popularity,
                    });
                }
            }
        }
    }

    Ok(rows)
}

/// Render the trade-off rows as an aligned text table.
pub fn render_tradeoff_table(rows: &[TradeoffRow], top_n: usize) -> String {
    let mut out = String::new();
    let headers = [
        format!("Precision@{}", top_n),
        format!("Recall@{}", top_n),
        format!("NDCG@{}", top_n),
        format!("Div@{}", top_n),
        format!("AvgPop@{}", top_n),
    ];

    let _ = writeln!(out, "{:-<98}", "");
    let _ = writeln!(
        out,
        "{:<16} {:<11} {:>13} {:>13} {:>13} {:>13} {:>13}",
        "System", "Metric", headers[0], headers[1], headers[2], headers[3], headers[4]
    );
    let _ = writeln!(out, "{:-<98}", "");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:<11} {:>13.4} {:>13.4} {:>13.4} {:>13.4} {:>13.4}",
            row.system, row.metric, row.precision, row.recall, row.ndcg, row.diversity, row.avg_popularity
        );
    }
    let _ = writeln!(out, "{:-<98}", "");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TagMap;

    fn tag_map(pairs: &[(&str, f64)]) -> TagMap {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    /// The documented three-track scenario: A and B share identical feature
    /// vectors and the rock tag; C is orthogonal and tagged jazz.
    fn scenario_table() -> Table {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let tags = vec![
            tag_map(&[("rock", 80.0)]),
            tag_map(&[("rock", 80.0)]),
            tag_map(&[("jazz", 70.0)]),
        ];
        let mut table = Table::build(ids, "(tag, weight)", tags).unwrap();
        table.add_numeric_column("f0", vec![1.0, 1.0, 0.0]).unwrap();
        table.add_numeric_column("f1", vec![0.0, 0.0, 1.0]).unwrap();
        table
            .add_numeric_column("total_listens", vec![10.0, 20.0, 30.0])
            .unwrap();
        table
    }

    fn feature_columns() -> Vec<String> {
        vec!["f0".to_string(), "f1".to_string()]
    }

    fn scenario_opts() -> EvalOptions {
        EvalOptions {
            top_n: 2,
            weight_threshold: 60.0,
            seed: 42,
        }
    }

    #[test]
    fn test_evaluate_query_concrete_scenario() {
        let table = scenario_table();
        let columns = feature_columns();
        let arm = RetrievalArm::Similarity {
            feature_columns: &columns,
            metric: SimilarityMetric::Cosine,
        };

        let scores = evaluate_query(&table, 0, &arm, "(tag, weight)", &scenario_opts()).unwrap();
        assert!((scores.precision - 0.5).abs() < 1e-12);
        assert!((scores.recall - 1.0).abs() < 1e-12);
        assert!((scores.mrr - 1.0).abs() < 1e-12);
        assert!((scores.ndcg - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_run_evaluations_keys_by_metric() {
        let table = scenario_table();
        let results = run_evaluations(
            &table,
            &[0, 1],
            &feature_columns(),
            &[SimilarityMetric::Cosine, SimilarityMetric::Euclidean],
            "(tag, weight)",
            &scenario_opts(),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.contains_key("cosine"));
        assert!(results.contains_key("euclidean"));
        // Queries a and b retrieve each other first in both metrics
        assert!((results["cosine"].mrr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_beyond_accuracy_concrete_scenario() {
        let table = scenario_table();
        let columns = feature_columns();
        let arm = RetrievalArm::Similarity {
            feature_columns: &columns,
            metric: SimilarityMetric::Cosine,
        };

        let scores = beyond_accuracy(
            &table,
            &[0],
            &arm,
            "(tag, weight)",
            "total_listens",
            &scenario_opts(),
        )
        .unwrap();

        assert!((scores.coverage - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores.diversity - 1.0).abs() < 1e-12);
        assert!((scores.avg_popularity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_tradeoffs_rows() {
        let table = scenario_table();
        let systems = vec![
            SystemSpec {
                name: "audio".to_string(),
                feature_columns: Some(feature_columns()),
            },
            SystemSpec {
                name: "baseline".to_string(),
                feature_columns: None,
            },
        ];

        let rows = evaluate_tradeoffs(
            &table,
            &[0],
            &systems,
            &[SimilarityMetric::Cosine, SimilarityMetric::Euclidean],
            "(tag, weight)",
            "total_listens",
            &scenario_opts(),
        )
        .unwrap();

        // Two metric rows for the similarity system, one for the baseline
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].system, "audio");
        assert_eq!(rows[0].metric, "cosine");
        assert_eq!(rows[1].metric, "euclidean");
        assert_eq!(rows[2].system, "baseline");
        assert_eq!(rows[2].metric, "random");

        assert!((rows[0].precision - 0.5).abs() < 1e-12);
        assert!((rows[0].diversity - 1.0).abs() < 1e-12);
        assert!((rows[0].avg_popularity - 0.75).abs() < 1e-12);

        // With N = table size - 1 the baseline retrieves both candidates, so
        // its beyond-accuracy scores match the similarity arm's
        assert!((rows[2].diversity - 1.0).abs() < 1e-12);
        assert!((rows[2].avg_popularity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_baseline_rows_are_reproducible() {
        let table = scenario_table();
        let systems = vec![SystemSpec {
            name: "baseline".to_string(),
            feature_columns: None,
        }];

        let run = |seed| {
            let opts = EvalOptions {
                top_n: 1,
                weight_threshold: 60.0,
                seed,
            };
            evaluate_tradeoffs(
                &table,
                &[0, 1, 2],
                &systems,
                &[],
                "(tag, weight)",
                "total_listens",
                &opts,
            )
            .unwrap()
        };

        let first = run(42);
        let second = run(42);
        assert_eq!(first[0].precision, second[0].precision);
        assert_eq!(first[0].diversity, second[0].diversity);
        assert_eq!(first[0].avg_popularity, second[0].avg_popularity);
    }

    #[test]
    fn test_empty_query_batch_is_fatal() {
        let table = scenario_table();
        let columns = feature_columns();
        let arm = RetrievalArm::Similarity {
            feature_columns: &columns,
            metric: SimilarityMetric::Cosine,
        };

        let err = mean_accuracy(&table, &[], &arm, "(tag, weight)", &scenario_opts()).unwrap_err();
        assert!(matches!(err, MirevalError::InvalidInput(_)));
    }

    #[test]
    fn test_render_tradeoff_table() {
        let rows = vec![TradeoffRow {
            system: "audio".to_string(),
            metric: "cosine".to_string(),
            precision: 0.5,
            recall: 1.0,
            ndcg: 1.0,
            diversity: 1.0,
            avg_popularity: 0.75,
        }];
        let rendered = render_tradeoff_table(&rows, 2);
        assert!(rendered.contains("Precision@2"));
        assert!(rendered.contains("AvgPop@2"));
        assert!(rendered.contains("audio"));
        assert!(rendered.contains("0.7500"));
        // MRR stays out of the trade-off table
        assert!(!rendered.contains("MRR"));
    }
}
