//! Similarity ranking over the candidate table's feature columns.

use crate::dataset::Table;
use crate::error::{MirevalError, Result};
use crate::retrieval::{Retrieved, SimilarityMetric};
use std::cmp::Ordering;

/// Rank the top-`n` candidates most similar to `query_row` under `metric`,
/// restricted to the named feature columns.
///
/// Scores every row of the table, sorts descending, drops the query's own
/// id, and keeps the first `n`. The sort is stable, so candidates with equal
/// scores keep their table order and repeated runs are reproducible. Scores
/// live in a per-call vector; the shared table is never written to, so
/// nothing leaks between configurations.
pub fn rank_by_similarity(
    table: &Table,
    query_row: usize,
    feature_columns: &[String],
    metric: SimilarityMetric,
    n: usize,
) -> Result<Vec<Retrieved>> {
    if query_row >= table.len() {
        return Err(MirevalError::InvalidInput(format!(
            "query row {} out of range for table of {} tracks",
            query_row,
            table.len()
        )));
    }
    if feature_columns.is_empty() {
        return Err(MirevalError::InvalidInput(
            "similarity ranking requires at least one feature column".to_string(),
        ));
    }

    let columns: Vec<&[f64]> = feature_columns
        .iter()
        .map(|name| table.numeric_column(name))
        .collect::<Result<_>>()?;
    let query_vector: Vec<f64> = columns.iter().map(|col| col[query_row]).collect();

    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(table.len());
    let mut candidate = vec![0.0; columns.len()];
    for row in 0..table.len() {
        for (value, col) in candidate.iter_mut().zip(&columns) {
            *value = col[row];
        }
        let score = match metric {
            SimilarityMetric::Cosine => cosine_similarity(&query_vector, &candidate),
            SimilarityMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(&query_vector, &candidate)),
        };
        scored.push((row, score));
    }

    // Stable sort: ties keep original table order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    Ok(scored
        .into_iter()
        .filter(|(row, _)| *row != query_row)
        .take(n)
        .map(|(row, score)| Retrieved {
            id: table.id(row).to_string(),
            score,
        })
        .collect())
}

/// Cosine similarity between two vectors of equal length, in [-1, 1].
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Euclidean distance between two vectors of equal length.
fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TagMap;

    fn feature_table(features: &[(&str, [f64; 2])]) -> Table {
        let ids = features.iter().map(|(id, _)| id.to_string()).collect();
        let tags = vec![TagMap::new(); features.len()];
        let mut table = Table::build(ids, "(tag, weight)", tags).unwrap();
        table
            .add_numeric_column("f0", features.iter().map(|(_, f)| f[0]).collect())
            .unwrap();
        table
            .add_numeric_column("f1", features.iter().map(|(_, f)| f[1]).collect())
            .unwrap();
        table
    }

    fn columns() -> Vec<String> {
        vec!["f0".to_string(), "f1".to_string()]
    }

    #[test]
    fn test_cosine_similarity_identical() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_zero_magnitude() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_excludes_query_and_orders_by_similarity() {
        let table = feature_table(&[
            ("a", [1.0, 0.0]),
            ("b", [1.0, 0.0]),
            ("c", [0.0, 1.0]),
        ]);
        let ranked =
            rank_by_similarity(&table, 0, &columns(), SimilarityMetric::Cosine, 2).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-12);
        assert!(ranked[1].score.abs() < 1e-12);
    }

    #[test]
    fn test_rank_size_bound() {
        let table = feature_table(&[
            ("a", [1.0, 0.0]),
            ("b", [0.5, 0.5]),
            ("c", [0.0, 1.0]),
        ]);
        // n larger than the table: at most len - 1 results
        let ranked =
            rank_by_similarity(&table, 0, &columns(), SimilarityMetric::Cosine, 10).unwrap();
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.id != "a"));
    }

    #[test]
    fn test_euclidean_scores_are_inverted_distances() {
        let table = feature_table(&[
            ("a", [0.0, 0.0]),
            ("b", [3.0, 4.0]),
            ("c", [0.0, 1.0]),
        ]);
        let ranked =
            rank_by_similarity(&table, 0, &columns(), SimilarityMetric::Euclidean, 2).unwrap();
        // c is closer (distance 1) than b (distance 5)
        assert_eq!(ranked[0].id, "c");
        assert!((ranked[0].score - 0.5).abs() < 1e-12);
        assert_eq!(ranked[1].id, "b");
        assert!((ranked[1].score - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_table_order() {
        let table = feature_table(&[
            ("a", [1.0, 0.0]),
            ("b", [2.0, 0.0]),
            ("c", [3.0, 0.0]),
        ]);
        // All candidates are colinear with the query: every cosine score is 1.0
        let ranked =
            rank_by_similarity(&table, 0, &columns(), SimilarityMetric::Cosine, 2).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_feature_column() {
        let table = feature_table(&[("a", [1.0, 0.0]), ("b", [0.0, 1.0])]);
        let err = rank_by_similarity(
            &table,
            0,
            &["f7".to_string()],
            SimilarityMetric::Cosine,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, MirevalError::UnknownColumn(_)));
    }

    #[test]
    fn test_query_row_out_of_range() {
        let table = feature_table(&[("a", [1.0, 0.0])]);
        let err =
            rank_by_similarity(&table, 5, &columns(), SimilarityMetric::Cosine, 1).unwrap_err();
        assert!(matches!(err, MirevalError::InvalidInput(_)));
    }
}
