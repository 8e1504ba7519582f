//! Seeded random baseline: the lower-bound control arm for every metric.

use crate::dataset::Table;
use crate::error::{MirevalError, Result};
use crate::retrieval::Retrieved;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Return `n` candidates chosen independently of the feature space.
///
/// Excludes the query's own id, then takes the first `n` of a seeded
/// pseudo-random permutation of the remaining rows. Same seed, table, and
/// query row always produce the same list.
pub fn rank_randomly(table: &Table, query_row: usize, seed: u64, n: usize) -> Result<Vec<Retrieved>> {
    if query_row >= table.len() {
        return Err(MirevalError::InvalidInput(format!(
            "query row {} out of range for table of {} tracks",
            query_row,
            table.len()
        )));
    }

    let mut rows: Vec<usize> = (0..table.len()).filter(|row| *row != query_row).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    Ok(rows
        .into_iter()
        .take(n)
        .map(|row| Retrieved {
            id: table.id(row).to_string(),
            score: 0.0,
        })
        .collect())
}
