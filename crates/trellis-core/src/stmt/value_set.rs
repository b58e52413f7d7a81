use super::{Value, ValueRecord};

use indexmap::IndexMap;

/// Rows returned by a query together with their column names.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueSet {
    pub columns: Vec<String>,
    pub rows: Vec<ValueRecord>,
}

impl ValueSet {
    pub fn new(columns: Vec<String>, rows: Vec<ValueRecord>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zips every row with the column names.
    pub fn into_maps(self) -> Vec<IndexMap<String, Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}
