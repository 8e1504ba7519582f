//! Accuracy metrics for one ranked result list: Precision@N, Recall@N,
//! NDCG@N, and reciprocal rank.

use crate::retrieval::Retrieved;
use std::collections::HashMap;

/// Accuracy scores for one query (or, averaged, for a query batch).
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyScores {
    pub precision: f64,
    pub recall: f64,
    pub ndcg: f64,
    pub mrr: f64,
}

/// Precision at K: proportion of the top-K results that are relevant.
/// Returns (relevant count in top-K) / K. If k is 0, returns 0.0.
pub fn precision_at_k(ranked: &[Retrieved], relevant: &HashMap<String, f64>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let retrieved_relevant = ranked
        .iter()
        .take(k)
        .filter(|r| relevant.contains_key(&r.id))
        .count();
    retrieved_relevant as f64 / k as f64
}

/// Recall at K: proportion of all relevant items that appear in the top-K.
/// Returns 0.0 when the relevant set is empty (avoids division by zero).
pub fn recall_at_k(ranked: &[Retrieved], relevant: &HashMap<String, f64>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let retrieved_relevant = ranked
        .iter()
        .take(k)
        .filter(|r| relevant.contains_key(&r.id))
        .count();
    retrieved_relevant as f64 / relevant.len() as f64
}

/// NDCG at K over binary gains in retrieval order.
///
/// Every retrieved item carries the same predicted score, so DCG is taken
/// over the list order as given and IDCG over the ideal arrangement of the
/// same binary-gain multiset. The result measures whether relevant items
/// appear early, not ranking confidence. Returns 0.0 when no retrieved item
/// is relevant.
pub fn ndcg_at_k(ranked: &[Retrieved], relevant: &HashMap<String, f64>, k: usize) -> f64 {
    let gains: Vec<f64> = ranked
        .iter()
        .take(k)
        .map(|r| if relevant.contains_key(&r.id) { 1.0 } else { 0.0 })
        .collect();

    let dcg = discounted_gain(&gains);

    let mut ideal = gains;
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let idcg = discounted_gain(&ideal);

    if idcg > 0.0 {
        dcg / idcg
    } else {
        0.0
    }
}

/// Reciprocal of the 1-based rank of the first relevant item over the whole
/// ranked list (not truncated to K); 0.0 if none is found.
pub fn reciprocal_rank(ranked: &[Retrieved], relevant: &HashMap<String, f64>) -> f64 {
    for (rank, r) in ranked.iter().enumerate() {
        if relevant.contains_key(&r.id) {
            return 1.0 / (rank + 1) as f64;
        }
    }
    0.0
}

/// All four accuracy metrics for one ranked list.
pub fn score_accuracy(
    ranked: &[Retrieved],
    relevant: &HashMap<String, f64>,
    k: usize,
) -> AccuracyScores {
    AccuracyScores {
        precision: precision_at_k(ranked, relevant, k),
        recall: recall_at_k(ranked, relevant, k),
        ndcg: ndcg_at_k(ranked, relevant, k),
        mrr: reciprocal_rank(ranked, relevant),
    }
}

/// DCG with the standard log2 position discount: gain_i / log2(i + 2).
fn discounted_gain(gains: &[f64]) -> f64 {
    gains
        .iter()
        .enumerate()
        .map(|(i, gain)| gain / ((i + 2) as f64).log2())
        .sum()
}
