use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// One result row as a column-name keyed map.
///
/// Column names are shared across every row of a result set; the values keep the
/// column order reported by the engine. Database NULL is stored as
/// [`RowValues::Null`], so a NULL column is present in the map, not missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMap {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order
    pub values: Vec<RowValues>,
    // name -> index, first occurrence wins for duplicate column names
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl RowMap {
    /// Create a new row map
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `values` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let cache = Arc::new(build_column_index(&column_names));
        Self::with_index(column_names, values, cache)
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        values: Vec<RowValues>,
        column_index_cache: Arc<HashMap<String, usize>>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index_cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Get a value from the row by column name
    ///
    /// Returns `None` only when the column does not exist; a NULL column yields
    /// `Some(&RowValues::Null)`.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// First column's value, used when a row is materialized into a scalar.
    #[must_use]
    pub fn first(&self) -> Option<&RowValues> {
        self.values.first()
    }

    #[must_use]
    pub fn contains_column(&self, column_name: &str) -> bool {
        self.column_index_cache.contains_key(column_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

pub(crate) fn build_column_index(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}
