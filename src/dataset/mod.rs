//! Candidate table: the merged, column-oriented dataset the evaluation runs over.

pub mod loader;
pub mod tags;

pub use loader::{load_dataset, LoadedDataset};

use crate::error::{MirevalError, Result};
use std::collections::{BTreeMap, HashMap};

/// Per-track tag-weight mapping. A weight of 0 means the tag is absent.
pub type TagMap = HashMap<String, f64>;

/// Column-oriented candidate table, read-only once built.
///
/// Rows are tracks in a stable order (the order of the first loaded source),
/// so a row index doubles as a query identifier. Ids are unique; every
/// numeric column covers every row; the tag column may hold empty maps but
/// is never missing.
#[derive(Debug, Clone)]
pub struct Table {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    numeric: BTreeMap<String, Vec<f64>>,
    text: BTreeMap<String, Vec<String>>,
    tags_column: String,
    tags: Vec<TagMap>,
}

impl Table {
    /// Create a table from row-aligned ids and parsed tag maps.
    /// Fails on duplicate ids or a tag column of the wrong length.
    pub fn build(ids: Vec<String>, tags_column: &str, tags: Vec<TagMap>) -> Result<Self> {
        if tags.len() != ids.len() {
            return Err(MirevalError::InvalidInput(format!(
                "tag column '{}' has {} rows, expected {}",
                tags_column,
                tags.len(),
                ids.len()
            )));
        }
        let mut index = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), row).is_some() {
                return Err(MirevalError::DataIntegrity(format!(
                    "duplicate id '{}' in candidate table",
                    id
                )));
            }
        }
        Ok(Self {
            ids,
            index,
            numeric: BTreeMap::new(),
            text: BTreeMap::new(),
            tags_column: tags_column.to_string(),
            tags,
        })
    }

    /// Attach a numeric column. Fails on length mismatch or a name collision.
    pub fn add_numeric_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.ids.len() {
            return Err(MirevalError::InvalidInput(format!(
                "column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.ids.len()
            )));
        }
        if self.numeric.contains_key(name) || self.text.contains_key(name) {
            return Err(MirevalError::DataIntegrity(format!(
                "column '{}' already present in candidate table",
                name
            )));
        }
        self.numeric.insert(name.to_string(), values);
        Ok(())
    }

    /// Attach a passthrough text column. Fails on length mismatch or a name collision.
    pub fn add_text_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.ids.len() {
            return Err(MirevalError::InvalidInput(format!(
                "column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.ids.len()
            )));
        }
        if self.numeric.contains_key(name) || self.text.contains_key(name) {
            return Err(MirevalError::DataIntegrity(format!(
                "column '{}' already present in candidate table",
                name
            )));
        }
        self.text.insert(name.to_string(), values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id of the track at `row`. Panics on out-of-range rows (callers bounds-check).
    pub fn id(&self, row: usize) -> &str {
        &self.ids[row]
    }

    /// Row index of the given id, if present.
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// A numeric column by name (feature columns, popularity).
    pub fn numeric_column(&self, name: &str) -> Result<&[f64]> {
        self.numeric
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MirevalError::UnknownColumn(name.to_string()))
    }

    /// A passthrough text column by name.
    pub fn text_column(&self, name: &str) -> Option<&[String]> {
        self.text.get(name).map(Vec::as_slice)
    }

    /// Names of all numeric columns, in sorted order.
    pub fn numeric_column_names(&self) -> impl Iterator<Item = &str> {
        self.numeric.keys().map(String::as_str)
    }

    /// Row-aligned tag maps. The column name must match the one the table
    /// was built with; the name travels through configuration end to end.
    pub fn tag_maps(&self, column: &str) -> Result<&[TagMap]> {
        if column != self.tags_column {
            return Err(MirevalError::UnknownColumn(column.to_string()));
        }
        Ok(&self.tags)
    }
}
