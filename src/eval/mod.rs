//! Evaluation core: relevance ground truth, accuracy metrics (P@N, R@N,
//! NDCG@N, MRR), beyond-accuracy metrics (coverage, diversity, popularity),
//! and the trade-off aggregator.

pub mod accuracy;
pub mod beyond;
pub mod relevance;
pub mod tradeoff;

pub use accuracy::{score_accuracy, AccuracyScores};
pub use beyond::{BeyondAccuracyScores, BeyondAccuracyState, PopularityRange};
pub use relevance::{relevant_set, weighted_jaccard};
pub use tradeoff::{
    beyond_accuracy, evaluate_query, evaluate_tradeoffs, render_tradeoff_table, run_evaluations,
    EvalOptions, TradeoffRow,
};
