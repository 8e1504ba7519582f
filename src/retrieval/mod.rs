//! Retrieval arms under evaluation: similarity ranking over feature columns
//! and the seeded random baseline.

pub mod random;
pub mod similarity;

pub use random::rank_randomly;
pub use similarity::rank_by_similarity;

use crate::dataset::Table;
use crate::error::{MirevalError, Result};
use std::fmt;
use std::str::FromStr;

/// Supported similarity metrics. Both are mapped to "higher is better"
/// scores: cosine directly, euclidean via `1 / (1 + distance)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimilarityMetric {
    Cosine,
    Euclidean,
}

impl SimilarityMetric {
    pub fn name(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Euclidean => "euclidean",
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = MirevalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" => Ok(SimilarityMetric::Euclidean),
            other => Err(MirevalError::UnsupportedMetric(other.to_string())),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a ranked result list. The baseline arm carries no
/// meaningful score and reports 0.0.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub id: String,
    pub score: f64,
}

/// One retrieval system under evaluation: a named feature-column subset,
/// or (without feature columns) the random baseline.
#[derive(Debug, Clone)]
pub struct SystemSpec {
    pub name: String,
    pub feature_columns: Option<Vec<String>>,
}

impl SystemSpec {
    pub fn is_baseline(&self) -> bool {
        self.feature_columns.is_none()
    }
}

/// A single (system, metric) ranking strategy, resolved from a `SystemSpec`.
#[derive(Debug, Clone, Copy)]
pub enum RetrievalArm<'a> {
    Similarity {
        feature_columns: &'a [String],
        metric: SimilarityMetric,
    },
    RandomBaseline {
        seed: u64,
    },
}

impl RetrievalArm<'_> {
    /// The metric label used in reports ("cosine", "euclidean", "random").
    pub fn label(&self) -> &'static str {
        match self {
            RetrievalArm::Similarity { metric, .. } => metric.name(),
            RetrievalArm::RandomBaseline { .. } => "random",
        }
    }

    /// Rank the top-`n` candidates for `query_row` under this arm.
    pub fn rank(&self, table: &Table, query_row: usize, n: usize) -> Result<Vec<Retrieved>> {
        match self {
            RetrievalArm::Similarity {
                feature_columns,
                metric,
            } => rank_by_similarity(table, query_row, feature_columns, *metric, n),
            RetrievalArm::RandomBaseline { seed } => rank_randomly(table, query_row, *seed, n),
        }
    }
}
