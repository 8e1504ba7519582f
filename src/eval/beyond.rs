//! Beyond-accuracy metrics: catalog coverage, tag diversity, and normalized
//! popularity of the retrieved lists.

use crate::dataset::Table;
use crate::error::{MirevalError, Result};
use crate::retrieval::Retrieved;
use std::collections::HashSet;

/// Precomputed global popularity range used for min-max normalization.
/// Passed explicitly so normalization is deterministic and testable in
/// isolation instead of being recomputed from ambient state per call.
#[derive(Debug, Clone, Copy)]
pub struct PopularityRange {
    pub min: f64,
    pub max: f64,
}

impl PopularityRange {
    pub fn from_column(values: &[f64]) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if values.is_empty() {
            Self { min: 0.0, max: 0.0 }
        } else {
            Self { min, max }
        }
    }

    /// Min-max normalize a value against this range; 0.0 when the range is
    /// degenerate (constant popularity across the table).
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            0.0
        }
    }
}

/// Final beyond-accuracy scores for one configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeyondAccuracyScores {
    pub coverage: f64,
    pub diversity: f64,
    pub avg_popularity: f64,
}

/// Per-configuration running state: the union of all retrieved ids (for
/// coverage) plus per-query diversity and popularity sums.
#[derive(Debug, Default)]
pub struct BeyondAccuracyState {
    retrieved_ids: HashSet<String>,
    diversity_sum: f64,
    popularity_sum: f64,
    queries: usize,
}

impl BeyondAccuracyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one query's ranked list into the running state and return that
    /// query's (diversity, popularity) contribution.
    ///
    /// Diversity is the number of distinct tags with weight >=
    /// `weight_threshold` among the retrieved items over the total number of
    /// qualifying (item, tag) instances; 0.0 when nothing qualifies.
    /// Popularity is the mean popularity of the retrieved items, min-max
    /// normalized against `range`.
    pub fn observe(
        &mut self,
        table: &Table,
        ranked: &[Retrieved],
        tags_column: &str,
        popularity_column: &str,
        weight_threshold: f64,
        range: &PopularityRange,
    ) -> Result<(f64, f64)> {
        let tag_maps = table.tag_maps(tags_column)?;
        let popularity = table.numeric_column(popularity_column)?;

        let mut unique_tags = HashSet::new();
        let mut total_tag_instances = 0usize;
        let mut popularity_total = 0.0;

        for retrieved in ranked {
            let row = table.row_of(&retrieved.id).ok_or_else(|| {
                MirevalError::InvalidInput(format!(
                    "retrieved id '{}' is not in the candidate table",
                    retrieved.id
                ))
            })?;
            self.retrieved_ids.insert(retrieved.id.clone());

            for (tag, &weight) in &tag_maps[row] {
                if weight >= weight_threshold {
                    unique_tags.insert(tag.as_str());
                    total_tag_instances += 1;
                }
            }
            popularity_total += popularity[row];
        }

        let diversity = if total_tag_instances > 0 {
            unique_tags.len() as f64 / total_tag_instances as f64
        } else {
            0.0
        };
        let normalized_popularity = if ranked.is_empty() {
            0.0
        } else {
            range.normalize(popularity_total / ranked.len() as f64)
        };

        self.diversity_sum += diversity;
        self.popularity_sum += normalized_popularity;
        self.queries += 1;

        Ok((diversity, normalized_popularity))
    }

    /// Catalog coverage so far: retrieved ids over table size.
    pub fn coverage(&self, table_len: usize) -> f64 {
        if table_len == 0 {
            return 0.0;
        }
        self.retrieved_ids.len() as f64 / table_len as f64
    }

    /// Final per-configuration scores: coverage plus the arithmetic mean of
    /// the per-query diversity and popularity contributions.
    pub fn finalize(&self, table_len: usize) -> BeyondAccuracyScores {
        if self.queries == 0 {
            return BeyondAccuracyScores::default();
        }
        BeyondAccuracyScores {
            coverage: self.coverage(table_len),
            diversity: self.diversity_sum / self.queries as f64,
            avg_popularity: self.popularity_sum / self.queries as f64,
        }
    }
}
