//! Relevance ground truth from weighted tag overlap.

use crate::dataset::{TagMap, Table};
use crate::error::{MirevalError, Result};
use std::collections::HashMap;

/// Weighted Jaccard similarity between two tag-weight mappings, in [0, 1].
///
/// Sum of per-tag `min` weights over sum of per-tag `max` weights, with an
/// absent tag counting as weight 0. Returns 0.0 when both mappings are empty.
pub fn weighted_jaccard(query_tags: &TagMap, candidate_tags: &TagMap) -> f64 {
    let mut intersection = 0.0;
    let mut union = 0.0;

    for (tag, &query_weight) in query_tags {
        let candidate_weight = candidate_tags.get(tag).copied().unwrap_or(0.0);
        intersection += query_weight.min(candidate_weight);
        union += query_weight.max(candidate_weight);
    }
    for (tag, &candidate_weight) in candidate_tags {
        if !query_tags.contains_key(tag) {
            union += candidate_weight;
        }
    }

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Graded relevance judgments for one query: every candidate in the table
/// whose weighted Jaccard score against the query is greater than zero,
/// keyed by id. The query itself is skipped; ranked lists never contain it,
/// so counting it would only deflate recall denominators.
pub fn relevant_set(table: &Table, query_row: usize, tags_column: &str) -> Result<HashMap<String, f64>> {
    if query_row >= table.len() {
        return Err(MirevalError::InvalidInput(format!(
            "query row {} out of range for table of {} tracks",
            query_row,
            table.len()
        )));
    }

    let tag_maps = table.tag_maps(tags_column)?;
    let query_tags = &tag_maps[query_row];

    let mut relevant = HashMap::new();
    for (row, candidate_tags) in tag_maps.iter().enumerate() {
        if row == query_row {
            continue;
        }
        let score = weighted_jaccard(query_tags, candidate_tags);
        if score > 0.0 {
            relevant.insert(table.id(row).to_string(), score);
        }
    }
    Ok(relevant)
}
