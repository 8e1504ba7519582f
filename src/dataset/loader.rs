//! Load the source TSVs, parse serialized columns, and merge everything into
//! one candidate table joined on the id column.

use crate::config::{DatasetConfig, SystemConfig};
use crate::dataset::{tags, Table, TagMap};
use crate::error::{MirevalError, Result};
use crate::retrieval::SystemSpec;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const ID_COLUMN: &str = "id";

/// The merged candidate table plus the per-system feature-column subsets.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub table: Table,
    pub systems: Vec<SystemSpec>,
}

/// One TSV file: trimmed (and possibly renamed) header plus raw string rows.
#[derive(Debug)]
struct TsvSource {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TsvSource {
    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Map id -> row position. Duplicate ids and a missing id column are fatal.
    fn index_by_id(&self) -> Result<HashMap<&str, usize>> {
        let id_pos = self.column_position(ID_COLUMN).ok_or_else(|| {
            MirevalError::DataIntegrity(format!("source '{}' has no '{}' column", self.name, ID_COLUMN))
        })?;
        let mut index = HashMap::with_capacity(self.rows.len());
        for (row, cells) in self.rows.iter().enumerate() {
            if index.insert(cells[id_pos].as_str(), row).is_some() {
                return Err(MirevalError::DataIntegrity(format!(
                    "duplicate id '{}' in source '{}'",
                    cells[id_pos], self.name
                )));
            }
        }
        Ok(index)
    }
}

/// Load the configured sources, merge them on id, parse the tag and genre
/// columns, and resolve each configured system's feature-column subset.
pub fn load_dataset(config: &DatasetConfig, systems: &[SystemConfig]) -> Result<LoadedDataset> {
    let mut sources = Vec::with_capacity(config.sources.len());
    for file in &config.sources {
        let source = read_tsv(&config.dir.join(file), file, config.rename.get(file))?;
        log::info!("loaded {} rows from {}", source.rows.len(), file);
        sources.push(source);
    }

    let mut table = merge_sources(&sources, config)?;

    let mut specs = Vec::with_capacity(systems.len());
    for system in systems {
        let feature_columns = match &system.features_file {
            None => None,
            Some(file) => {
                let source = read_tsv(&config.dir.join(file), file, config.rename.get(file))?;
                let columns = merge_feature_source(&mut table, &source, &system.name)?;
                Some(columns)
            }
        };
        specs.push(SystemSpec {
            name: system.name.clone(),
            feature_columns,
        });
    }

    // The popularity column must have survived the merge as numeric
    table.numeric_column(&config.popularity_column).map_err(|_| {
        MirevalError::DataIntegrity(format!(
            "popularity column '{}' is missing or not numeric",
            config.popularity_column
        ))
    })?;

    log::info!(
        "merged candidate table: {} tracks, {} numeric columns, {} systems",
        table.len(),
        table.numeric_column_names().count(),
        specs.len()
    );

    Ok(LoadedDataset { table, systems: specs })
}

/// Read a TSV file into memory. Header names are whitespace-trimmed and
/// renamed per the source's rename map; ragged rows are fatal.
fn read_tsv(path: &Path, name: &str, rename: Option<&HashMap<String, String>>) -> Result<TsvSource> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines
        .next()
        .ok_or_else(|| MirevalError::Parse(format!("source '{}' is empty", name)))?;
    let columns: Vec<String> = header
        .split('\t')
        .map(|c| {
            let trimmed = c.trim();
            match rename.and_then(|map| map.get(trimmed)) {
                Some(renamed) => renamed.clone(),
                None => trimmed.to_string(),
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<String> = line.split('\t').map(str::to_string).collect();
        if cells.len() != columns.len() {
            return Err(MirevalError::Parse(format!(
                "source '{}' line {}: expected {} cells, found {}",
                name,
                line_no + 2,
                columns.len(),
                cells.len()
            )));
        }
        rows.push(cells);
    }

    Ok(TsvSource {
        name: name.to_string(),
        columns,
        rows,
    })
}

/// Inner-join all sources on id, in the row order of the first source.
/// Every id must resolve in every source; anything unmerged is fatal.
fn merge_sources(sources: &[TsvSource], config: &DatasetConfig) -> Result<Table> {
    let first = sources
        .first()
        .ok_or_else(|| MirevalError::Config("no dataset sources configured".to_string()))?;
    let first_id_pos = first.column_position(ID_COLUMN).ok_or_else(|| {
        MirevalError::DataIntegrity(format!("source '{}' has no '{}' column", first.name, ID_COLUMN))
    })?;
    let ids: Vec<String> = first.rows.iter().map(|cells| cells[first_id_pos].clone()).collect();
    let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();

    // Row-aligned tag maps, filled when the tag column is encountered
    let mut tag_maps: Option<Vec<TagMap>> = None;
    // (name, values) in source order, classified below
    let mut numeric_columns: Vec<(String, Vec<f64>)> = Vec::new();
    let mut text_columns: Vec<(String, Vec<String>)> = Vec::new();

    for source in sources {
        let index = source.index_by_id()?;

        for id in &id_set {
            if !index.contains_key(*id) {
                return Err(MirevalError::DataIntegrity(format!(
                    "id '{}' is missing from source '{}'",
                    id, source.name
                )));
            }
        }
        for id in index.keys() {
            if !id_set.contains(id) {
                return Err(MirevalError::DataIntegrity(format!(
                    "source '{}' has id '{}' unknown to '{}'",
                    source.name, id, first.name
                )));
            }
        }

        for (pos, column) in source.columns.iter().enumerate() {
            if column == ID_COLUMN {
                continue;
            }
            // Cells in table row order
            let cells: Vec<&str> = ids
                .iter()
                .map(|id| source.rows[index[id.as_str()]][pos].as_str())
                .collect();

            if *column == config.tags_column {
                let mut maps = Vec::with_capacity(cells.len());
                for (row, cell) in cells.iter().enumerate() {
                    let map = tags::parse_tag_map(cell).map_err(|e| {
                        MirevalError::Parse(format!(
                            "tag column for id '{}' in '{}': {}",
                            ids[row], source.name, e
                        ))
                    })?;
                    maps.push(map);
                }
                tag_maps = Some(maps);
            } else if *column == config.genre_column {
                let mut joined = Vec::with_capacity(cells.len());
                for (row, cell) in cells.iter().enumerate() {
                    let genres = tags::parse_string_list(cell).map_err(|e| {
                        MirevalError::Parse(format!(
                            "genre column for id '{}' in '{}': {}",
                            ids[row], source.name, e
                        ))
                    })?;
                    joined.push(genres.join("; "));
                }
                text_columns.push((column.clone(), joined));
            } else if let Some(values) = parse_numeric_column(&cells) {
                numeric_columns.push((column.clone(), values));
            } else {
                text_columns.push((column.clone(), cells.iter().map(|c| c.to_string()).collect()));
            }
        }
    }

    let tag_maps = tag_maps.ok_or_else(|| {
        MirevalError::DataIntegrity(format!(
            "tag column '{}' not found in any source",
            config.tags_column
        ))
    })?;

    let mut table = Table::build(ids, &config.tags_column, tag_maps)?;
    for (name, values) in numeric_columns {
        table.add_numeric_column(&name, values)?;
    }
    for (name, values) in text_columns {
        table.add_text_column(&name, values)?;
    }
    Ok(table)
}

/// Merge a feature-embedding source into the table. Non-numeric columns
/// (e.g. a redundant song title) are dropped; the numeric ones become the
/// owning system's feature-column subset.
fn merge_feature_source(table: &mut Table, source: &TsvSource, system: &str) -> Result<Vec<String>> {
    let index = source.index_by_id()?;

    for row in 0..table.len() {
        if !index.contains_key(table.id(row)) {
            return Err(MirevalError::DataIntegrity(format!(
                "id '{}' is missing from feature source '{}'",
                table.id(row),
                source.name
            )));
        }
    }
    for id in index.keys() {
        if table.row_of(id).is_none() {
            return Err(MirevalError::DataIntegrity(format!(
                "feature source '{}' has unknown id '{}'",
                source.name, id
            )));
        }
    }

    let mut feature_columns = Vec::new();
    for (pos, column) in source.columns.iter().enumerate() {
        if column == ID_COLUMN {
            continue;
        }
        let cells: Vec<&str> = (0..table.len())
            .map(|row| source.rows[index[table.id(row)]][pos].as_str())
            .collect();
        match parse_numeric_column(&cells) {
            Some(values) => {
                table.add_numeric_column(column, values)?;
                feature_columns.push(column.clone());
            }
            None => {
                log::debug!(
                    "dropping non-numeric column '{}' from feature source '{}'",
                    column,
                    source.name
                );
            }
        }
    }

    if feature_columns.is_empty() {
        return Err(MirevalError::DataIntegrity(format!(
            "feature source '{}' for system '{}' has no numeric columns",
            source.name, system
        )));
    }
    Ok(feature_columns)
}

/// Parse every cell as f64, or return None if any cell is non-numeric.
fn parse_numeric_column(cells: &[&str]) -> Option<Vec<f64>> {
    cells.iter().map(|c| c.trim().parse::<f64>().ok()).collect()
}
